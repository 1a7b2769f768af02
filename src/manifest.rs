//! `Summ.cnf` manifest describing a summary build.
//!
//! Consumers read this JSON file to learn the block widths and how the
//! summary blocks are encoded.

use crate::config::PyramidConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Manifest file name, written next to the summary directory.
pub const MANIFEST_FILE_NAME: &str = "Summ.cnf";

/// Encoder method name of the multi-category count scheme.
pub const MULTI_CAT_COUNT: &str = "MultiCatCount";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EncoderInfo {
    #[serde(rename = "ID")]
    pub id: String,
    pub cat_count: usize,
    pub encoder_len: usize,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SummariserInfo {
    #[serde(rename = "PropID")]
    pub prop_id: String,
    #[serde(rename = "IDExt")]
    pub id_ext: String,
    pub method: String,
    pub encoder: EncoderInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Manifest {
    pub block_size_start: u64,
    pub block_size_incr_factor: u64,
    pub block_size_max: u64,
    pub properties: Vec<PropertyInfo>,
    pub summarisers: Vec<SummariserInfo>,
}

/// Property ID derived from a data file name: everything before the first `.`.
pub fn property_id<P: AsRef<Path>>(data_file: P) -> String {
    let name = data_file
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.split('.').next().unwrap_or_default().to_string()
}

impl Manifest {
    /// Manifest for a multi-category count build of property `prop_id`.
    pub fn multi_cat_count(config: &PyramidConfig, prop_id: &str, encoder_len: usize) -> Self {
        let encoder = EncoderInfo {
            id: MULTI_CAT_COUNT.to_string(),
            cat_count: config.categories.len(),
            encoder_len,
            categories: config.categories.clone(),
        };
        Self {
            block_size_start: config.block_size_start,
            block_size_incr_factor: config.block_size_incr_factor,
            block_size_max: config.block_size_max,
            properties: vec![PropertyInfo {
                id: prop_id.to_string(),
                kind: "Text".to_string(),
            }],
            summarisers: vec![SummariserInfo {
                prop_id: prop_id.to_string(),
                id_ext: "cats".to_string(),
                method: MULTI_CAT_COUNT.to_string(),
                encoder,
            }],
        }
    }

    /// Write the manifest as indented JSON followed by a newline.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
