//! ZIP archive helper utilities for writing Excel (.xlsx) packages
//! Provides a convenient way to stream one XML part into an archive entry

use crate::error::UpdError;
use crate::helpers::xml::XmlWriter;
use std::io::Seek;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// Helper trait for ZIP archive operations with XML part creation
pub(crate) trait ZipHelper<W: Write + Seek> {
    /// Starts a deflated entry, writes the XML declaration and lets `build` fill the body
    fn xml_entry<F>(&mut self, name: &str, build: F) -> Result<(), UpdError>
    where
        F: FnOnce(&mut XmlWriter<&mut ZipWriter<W>>) -> Result<(), UpdError>;
}

impl<W: Write + Seek> ZipHelper<W> for ZipWriter<W> {
    fn xml_entry<F>(&mut self, name: &str, build: F) -> Result<(), UpdError>
    where
        F: FnOnce(&mut XmlWriter<&mut ZipWriter<W>>) -> Result<(), UpdError>,
    {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.start_file(name.replace('\\', "/"), options)?;
        let mut writer = XmlWriter::new(self);
        writer.declaration()?;
        build(&mut writer)
    }
}
