mod disks;
mod power;
mod privilege;

pub use disks::{
    Disk, DiskInventory, DryrunInventory, InventoryError, LsblkInventory, create_inventory,
    parse_lsblk,
};
pub use power::CompletionAction;
pub use privilege::ensure_privileged;
