mod file_info;
mod mem_file;
mod mem_fs;

pub use file_info::{FILE_MODE, FileInfo};
pub use mem_file::MemFile;
pub use mem_fs::MemFS;
