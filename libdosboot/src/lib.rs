pub mod callback;
pub mod code_page;
pub mod cross;
pub mod dos_error_codes;
pub mod dos_info_block;
pub mod dos_layout;
pub mod dos_memory;
pub mod dos_tables;
pub mod error;
pub mod host_directory;
pub mod memory;
pub mod short_name;

pub use error::Error;

// http://www.ctyme.com/intr/rb-2983.htm
// http://stanislavs.org/helppc/int_21.html
// The kernel tables are built once at boot (dos_tables), host directories are listed on demand
// (host_directory). Neither depends on the other.
