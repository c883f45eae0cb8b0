//! Mob agent snapshots with zstd compression.
//!
//! An agent file is a fixed header followed by a zstd-compressed bincode
//! payload of [`AgentRecord`]s. The header carries a CRC32 of the compressed
//! bytes so truncated or corrupted files are rejected before decoding.

use crate::agent::Mob;
use crate::profile::MobKind;
use anyhow::{Context, Result};
use crc32fast::Hasher;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use voxmob_core::EntityId;

/// Magic number for agent file identification ("VXAG").
const AGENT_MAGIC: u32 = 0x5658_4147;

/// Current agent file format version.
const AGENT_VERSION: u16 = 1;

const HEADER_LEN: usize = 14;

/// Persisted subset of a mob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: EntityId,
    pub kind: MobKind,
    pub position: DVec3,
    pub velocity: DVec3,
    pub yaw: f64,
    pub pitch: f64,
    pub health: i32,
    pub target: Option<EntityId>,
}

impl AgentRecord {
    pub fn capture(mob: &Mob) -> Self {
        Self {
            id: mob.id,
            kind: mob.kind,
            position: mob.body.position(),
            velocity: mob.body.velocity,
            yaw: mob.body.yaw,
            pitch: mob.body.pitch,
            health: mob.health,
            target: mob.agent.target,
        }
    }
}

#[derive(Debug, Clone)]
struct AgentHeader {
    magic: u32,
    version: u16,
    crc32: u32,
    payload_len: u32,
}

impl AgentHeader {
    fn new(crc32: u32, payload_len: u32) -> Self {
        Self {
            magic: AGENT_MAGIC,
            version: AGENT_VERSION,
            crc32,
            payload_len,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        bytes.extend_from_slice(&self.magic.to_le_bytes());
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.crc32.to_le_bytes());
        bytes.extend_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            anyhow::bail!("Agent header too short");
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != AGENT_MAGIC {
            anyhow::bail!(
                "Invalid agent magic: expected 0x{:08X}, got 0x{:08X}",
                AGENT_MAGIC,
                magic
            );
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != AGENT_VERSION {
            anyhow::bail!("Unsupported agent file version {version}");
        }
        let crc32 = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let payload_len = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);

        Ok(Self {
            magic,
            version,
            crc32,
            payload_len,
        })
    }
}

fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Encode records into a self-checking byte buffer.
pub fn encode_agents(records: &[AgentRecord]) -> Result<Vec<u8>> {
    let serialized = bincode::serialize(records).context("Failed to serialize agents")?;
    let compressed = zstd::encode_all(&serialized[..], 3).context("Failed to compress agents")?;
    let payload_len = u32::try_from(compressed.len()).context("Agent payload too large")?;

    let header = AgentHeader::new(checksum(&compressed), payload_len);
    let mut bytes = header.to_bytes();
    bytes.extend_from_slice(&compressed);
    Ok(bytes)
}

/// Decode a buffer produced by [`encode_agents`].
pub fn decode_agents(bytes: &[u8]) -> Result<Vec<AgentRecord>> {
    let header = AgentHeader::from_bytes(bytes)?;
    let payload = bytes
        .get(HEADER_LEN..HEADER_LEN + header.payload_len as usize)
        .context("Agent payload truncated")?;

    let computed_crc = checksum(payload);
    if computed_crc != header.crc32 {
        anyhow::bail!(
            "CRC32 mismatch: expected {:08X}, got {:08X}",
            header.crc32,
            computed_crc
        );
    }

    let decompressed = zstd::decode_all(payload).context("Failed to decompress agents")?;
    bincode::deserialize(&decompressed).context("Failed to deserialize agents")
}

/// Write records to `path`, creating parent directories.
pub fn save_agents(path: &Path, records: &[AgentRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create agent directory")?;
    }
    let bytes = encode_agents(records)?;
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create agent file {}", path.display()))?;
    file.write_all(&bytes).context("Failed to write agents")?;
    Ok(())
}

pub fn load_agents(path: &Path) -> Result<Vec<AgentRecord>> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open agent file {}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .context("Failed to read agent file")?;
    decode_agents(&bytes)
}
