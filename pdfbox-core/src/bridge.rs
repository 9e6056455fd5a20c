//! Stream bridging for subcommands that only accept file paths
//!
//! The toolkit reads and writes files, never pipes. These calls copy the
//! caller's input into a temp file, point the matching [`Arg::Input`] slot at
//! it, and for the writer variant hand back whatever the subcommand wrote to
//! the [`Arg::Output`] temp file. All temp files are removed before
//! returning, whether the call succeeded or not.

use crate::args::{self, Arg, SlotSet};
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::scratch::{self, copy_with_cancel};
use crate::toolkit::{ToolkitHandle, SCRATCH_PREFIX};
use std::fs::File;
use std::io::{BufReader, Read, Write};

impl ToolkitHandle {
    /// Run `command` with `input` materialized into the [`Arg::Input`] slot(s).
    ///
    /// # Errors
    /// [`Error::Argument`] when `args` has no input slot or has an output
    /// slot; checked before anything touches the filesystem. Otherwise any
    /// error from [`ToolkitHandle::execute`] or from copying `input`.
    pub fn execute_with_reader(
        &self,
        cancel: &CancelToken,
        input: &mut dyn Read,
        command: &str,
        args: &[Arg],
    ) -> Result<()> {
        args::validate(args, SlotSet::InputOnly).map_err(|reason| Error::argument(command, reason))?;
        let cancel = self.effective_token(cancel);

        scratch::with_input_file(
            self.scratch_dir(),
            SCRATCH_PREFIX,
            "",
            input,
            &cancel,
            |input_path| {
                let resolved = args::resolve(args, input_path, None);
                self.execute(&cancel, command, &resolved)
            },
        )
    }

    /// Run `command` with `input` in the [`Arg::Input`] slot(s) and copy the
    /// file produced at the [`Arg::Output`] slot into `output`.
    ///
    /// `output` is only written after the subcommand succeeded; if a later
    /// copy step fails its contents are undefined.
    ///
    /// # Errors
    /// [`Error::Argument`] when either slot kind is missing. Otherwise any
    /// error from execution or from copying in either direction.
    pub fn execute_with_reader_and_writer(
        &self,
        cancel: &CancelToken,
        input: &mut dyn Read,
        output: &mut dyn Write,
        command: &str,
        args: &[Arg],
    ) -> Result<()> {
        args::validate(args, SlotSet::InputAndOutput)
            .map_err(|reason| Error::argument(command, reason))?;
        let cancel = self.effective_token(cancel);
        let scratch_dir = self.scratch_dir();

        scratch::with_input_file(scratch_dir, SCRATCH_PREFIX, "", input, &cancel, |input_path| {
            scratch::with_empty_file(scratch_dir, SCRATCH_PREFIX, "", |output_path| {
                let resolved = args::resolve(args, input_path, Some(output_path));
                self.execute(&cancel, command, &resolved)?;

                let file = File::open(output_path).map_err(|e| {
                    Error::io(format!("failed to open output {}", output_path.display()), e)
                })?;
                let copied = copy_with_cancel(
                    &mut BufReader::new(file),
                    output,
                    &cancel,
                    &format!("output of {command}"),
                )?;
                log::debug!("📤 {} produced {} bytes", command, copied);
                Ok(())
            })
        })
    }
}
