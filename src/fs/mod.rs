pub mod clone;
pub mod read;
pub mod write;

pub use clone::{clone_contents, copy_range};
pub use read::{list_xattrs, read_symlink_target, EntryKind, EntryStat};
pub use write::{
    create_device, create_dir, create_fifo, create_hardlink, create_socket, create_symlink,
    lchown, set_times,
};
