//! Typed wrappers for commonly used toolkit subcommands

use crate::args::Arg;
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::toolkit::ToolkitHandle;
use std::io::{Read, Write};

pub const EXTRACT_TEXT: &str = "ExtractText";
pub const TEXT_TO_PDF: &str = "TextToPDF";

impl ToolkitHandle {
    /// Extract the plain text of the PDF read from `pdf` into `text`
    pub fn extract_text(
        &self,
        cancel: &CancelToken,
        pdf: &mut dyn Read,
        text: &mut dyn Write,
    ) -> Result<()> {
        self.execute_with_reader_and_writer(cancel, pdf, text, EXTRACT_TEXT, &[Arg::Input, Arg::Output])
    }

    /// Extract text with `-sort`, ordering text by position on the page
    pub fn extract_text_sorted(
        &self,
        cancel: &CancelToken,
        pdf: &mut dyn Read,
        text: &mut dyn Write,
    ) -> Result<()> {
        self.execute_with_reader_and_writer(
            cancel,
            pdf,
            text,
            EXTRACT_TEXT,
            &[Arg::literal("-sort"), Arg::Input, Arg::Output],
        )
    }

    /// Render the plain text read from `text` as a PDF written to `pdf`
    pub fn text_to_pdf(
        &self,
        cancel: &CancelToken,
        text: &mut dyn Read,
        pdf: &mut dyn Write,
    ) -> Result<()> {
        // TextToPDF takes the output file first
        self.execute_with_reader_and_writer(cancel, text, pdf, TEXT_TO_PDF, &[Arg::Output, Arg::Input])
    }
}
