use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::backends::Sink;
use crate::common::FactCollection;
use crate::errors::PersistError;

// -- 🚰 FileSinkConfig — lives right next to its FileSink bestie. One backend = one config = one file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FileSinkConfig {
    #[serde(default = "default_file_name")]
    pub file_name: PathBuf,
}

fn default_file_name() -> PathBuf {
    PathBuf::from("./data.json")
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
        }
    }
}

/// 🚰 FileSink — serializes the finished collection and writes it to disk. Once.
///
/// ⚠️ The write truncates whatever was there. No warning. No backup. Just gone.
/// Nothing touches the path until `persist` is called, so a run that dies during
/// the fetch phase never creates (or clobbers) the output file.
#[derive(Debug)]
pub(crate) struct FileSink {
    sink_config: FileSinkConfig,
}

impl FileSink {
    pub(crate) fn new(sink_config: FileSinkConfig) -> Self {
        Self { sink_config }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.sink_config.file_name
    }
}

/// 🎨 `{"facts": [...]}`, pretty-printed with a one-space indent.
///
/// Field order comes from struct declaration order and the formatter is fixed,
/// so the same collection always renders to the same bytes.
pub(crate) fn render(collection: &FactCollection) -> Result<Vec<u8>, PersistError> {
    let mut rendered = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut rendered, formatter);
    collection
        .serialize(&mut serializer)
        .map_err(PersistError::Serialize)?;
    Ok(rendered)
}

#[async_trait]
impl Sink for FileSink {
    /// 📡 Render, then one `write` call. That's the whole job.
    async fn persist(&mut self, collection: &FactCollection) -> Result<(), PersistError> {
        let rendered = render(collection)?;
        trace!(
            "📬 {} bytes of facts walked into the file sink — writing it all down",
            rendered.len()
        );
        tokio::fs::write(&self.sink_config.file_name, &rendered)
            .await
            .map_err(|source| PersistError::Write {
                path: self.sink_config.file_name.clone(),
                source,
            })?;
        debug!(
            "💾 wrote {} facts to '{}'",
            collection.len(),
            self.sink_config.file_name.display()
        );
        Ok(())
    }
}
