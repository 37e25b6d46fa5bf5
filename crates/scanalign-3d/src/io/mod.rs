/// Plain text point cloud reader and writer.
pub mod txt;
