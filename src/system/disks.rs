use std::io;
use std::process::Command;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

/// Device name prefixes that never make sense as an install target
const VIRTUAL_PREFIXES: [&str; 3] = ["loop", "ram", "zram"];

const UNKNOWN_MODEL: &str = "Unknown";

/// A whole-disk block device as reported by the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disk {
    pub name: String,
    /// Human-readable size (e.g. `476.9G`)
    pub size: String,
    pub model: String,
}

impl Disk {
    pub fn path(&self) -> String {
        format!("/dev/{}", self.name)
    }
}

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Could not run lsblk: {0}")]
    Unavailable(#[from] io::Error),

    #[error("Disk detection failed: {0}")]
    Failed(String),
}

/// Source of candidate install targets
pub trait DiskInventory: Send + Sync {
    fn list_disks(&self) -> Result<Vec<Disk>, InventoryError>;
}

/// Queries the running system with `lsblk`
pub struct LsblkInventory;

impl DiskInventory for LsblkInventory {
    fn list_disks(&self) -> Result<Vec<Disk>, InventoryError> {
        let output = Command::new("lsblk")
            .args(["-d", "-n", "-o", "NAME,SIZE,MODEL"])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("lsblk failed with code {:?}: {}", output.status.code(), stderr);
            return Err(InventoryError::Failed(if stderr.is_empty() {
                format!("lsblk exited with code {:?}", output.status.code())
            } else {
                stderr
            }));
        }

        let disks = parse_lsblk(&String::from_utf8_lossy(&output.stdout));
        info!("Detected {} disk(s)", disks.len());
        Ok(disks)
    }
}

/// Fixed sample disks for dry runs
pub struct DryrunInventory;

impl DiskInventory for DryrunInventory {
    fn list_disks(&self) -> Result<Vec<Disk>, InventoryError> {
        Ok(parse_lsblk(
            "sda    476.9G Samsung SSD 860 EVO 500GB\n\
             nvme0n1  1.8T WD_BLACK SN850X 2000GB\n\
             sdb     14.9G\n",
        ))
    }
}

pub fn create_inventory(dryrun: bool) -> Arc<dyn DiskInventory> {
    if dryrun {
        Arc::new(DryrunInventory)
    } else {
        Arc::new(LsblkInventory)
    }
}

/// Parse `lsblk -d -n -o NAME,SIZE,MODEL` output
pub fn parse_lsblk(output: &str) -> Vec<Disk> {
    output.lines().filter_map(parse_lsblk_line).collect()
}

fn parse_lsblk_line(line: &str) -> Option<Disk> {
    let mut fields = line.split_whitespace();
    let name = fields.next()?;
    let size = fields.next()?;

    if VIRTUAL_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
        debug!("Skipping virtual device {name}");
        return None;
    }

    let model = fields.collect::<Vec<_>>().join(" ");
    Some(Disk {
        name: name.to_string(),
        size: size.to_string(),
        model: if model.is_empty() {
            UNKNOWN_MODEL.to_string()
        } else {
            model
        },
    })
}
