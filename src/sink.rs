use std::io::Write;

use kan_vod_core::{ContentKind, DirectoryEntry, ListingSink, Result, SortMethod, VodError};
use serde::Serialize;

/// One host call, written as a single JSON line.
#[derive(Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
enum HostCall<'a> {
    SetPluginCategory { handle: i32, label: &'a str },
    SetContent { handle: i32, content: ContentKind },
    AddDirectoryItem {
        handle: i32,
        #[serde(flatten)]
        entry: &'a DirectoryEntry,
    },
    AddSortMethod { handle: i32, method: SortMethod },
    EndOfDirectory { handle: i32, succeeded: bool },
    SetResolvedUrl { handle: i32, succeeded: bool, url: &'a str },
}

/// Listing sink that speaks to the host bridge over a byte stream.
pub struct JsonLinesSink<W: Write> {
    out: W,
    handle: i32,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W, handle: i32) -> Self {
        Self { out, handle }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, call: HostCall<'_>) -> Result<()> {
        let line = serde_json::to_string(&call).map_err(|e| VodError::Sink { reason: e.to_string() })?;
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> ListingSink for JsonLinesSink<W> {
    fn set_plugin_category(&mut self, label: &str) -> Result<()> {
        self.emit(HostCall::SetPluginCategory { handle: self.handle, label })
    }

    fn set_content(&mut self, content: ContentKind) -> Result<()> {
        self.emit(HostCall::SetContent { handle: self.handle, content })
    }

    fn add_directory_item(&mut self, entry: &DirectoryEntry) -> Result<()> {
        self.emit(HostCall::AddDirectoryItem { handle: self.handle, entry })
    }

    fn add_sort_method(&mut self, method: SortMethod) -> Result<()> {
        self.emit(HostCall::AddSortMethod { handle: self.handle, method })
    }

    fn end_of_directory(&mut self, succeeded: bool) -> Result<()> {
        self.emit(HostCall::EndOfDirectory { handle: self.handle, succeeded })
    }

    fn set_resolved_url(&mut self, url: &str) -> Result<()> {
        self.emit(HostCall::SetResolvedUrl { handle: self.handle, succeeded: true, url })
    }
}
