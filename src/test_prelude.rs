//! Shared fixtures for unit tests.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::header::{TEXB_MAGIC, TIMG_MAGIC};

/// Assembles TEXB byte streams with a correct total-size field.
pub(crate) struct TexbBuilder {
    prefix:  Vec<u8>,
    width:   u16,
    height:  u16,
    flags:   u16,
    entries: Vec<([u8; 4], Vec<u8>)>,
    method:  Option<u32>,
    payload: Vec<u8>,
}

impl TexbBuilder {
    pub(crate) fn new(width: u16, height: u16, flags: u16) -> Self {
        Self {
            prefix: Vec::new(),
            width,
            height,
            flags,
            entries: Vec::new(),
            method: None,
            payload: Vec::new(),
        }
    }

    pub(crate) fn prefix(mut self, prefix: &[u8]) -> Self {
        self.prefix = prefix.to_vec();
        self
    }

    pub(crate) fn entry(self, body: &[u8]) -> Self {
        self.raw_entry(TIMG_MAGIC, body)
    }

    pub(crate) fn raw_entry(mut self, tag: &[u8; 4], body: &[u8]) -> Self {
        self.entries.push((*tag, body.to_vec()));
        self
    }

    pub(crate) fn method(mut self, method: u32) -> Self {
        self.method = Some(method);
        self
    }

    pub(crate) fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(TEXB_MAGIC);
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(self.prefix.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        out.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());
        for (tag, body) in &self.entries {
            out.extend_from_slice(tag);
            out.extend_from_slice(&(body.len() as u16).to_be_bytes());
            out.extend_from_slice(body);
        }
        if let Some(method) = self.method {
            out.extend_from_slice(&method.to_be_bytes());
        }
        out.extend_from_slice(&self.payload);
        let size = (out.len() - 8) as u32;
        out[4..8].copy_from_slice(&size.to_be_bytes());
        out
    }
}

/// zlib stream at the given flate2 level.
pub(crate) fn zlib(data: &[u8], level: Compression) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), level);
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}
