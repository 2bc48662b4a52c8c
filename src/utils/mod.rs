mod byte_cursor;
pub(crate) mod bytes;
mod hexdump;
pub mod text;

pub use self::byte_cursor::ByteCursor;
pub use self::hexdump::{hexdump, hexdump_around};
pub use self::text::decode_fixed_text;
