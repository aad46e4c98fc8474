use crate::document::NodeId;
use crc32fast::Hasher;

/// Generate a document seed from its file path using CRC32.
pub fn get_document_seed(path: &str) -> String {
    let mut buff = String::from(path);
    if !path.starts_with("file://") {
        buff = format!("file://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential node-id generator. Ids are deterministic for a given source
/// path, so re-parsing an unchanged file yields the same identities.
#[derive(Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(path: &str) -> Self {
        Self {
            seed: get_document_seed(path),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    pub fn next_id(&mut self) -> NodeId {
        self.count += 1;
        NodeId::new(format!("{}-{}", self.seed, self.count))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
