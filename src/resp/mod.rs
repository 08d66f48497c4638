mod reader;
mod value;

pub use reader::RespReader;
pub use value::RespValue;
