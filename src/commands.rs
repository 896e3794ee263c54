//! This module defines the `Command` enum and its associated methods for parsing
//! and handling user commands in the FAT32 volume explorer.
//!
//! The `Command` enum represents the commands that the user can input, such as opening an
//! image, listing the current directory, changing directory or retrieving a file.

/// Represents a user command in the FAT32 volume explorer.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Command to quit the program.
    Quit,
    /// Command to open a volume image, encapsulating the file path as a `String`.
    Open(String),
    /// Command to print the boot sector and free space information.
    Info,
    /// Command to list the current directory.
    Dir,
    /// Command to change the current directory, encapsulating the `/` separated path.
    Cd(String),
    /// Command to copy a file of the current directory into the working directory.
    Get(String),
    /// Command to print the layout of the volume.
    Layout,
    /// Skip the strict Bpb validation of the next `open`.
    Skip,
    /// Command to write a file on the volume.
    Put,
    /// Command for an unknown input, encapsulating the raw input as a `String`.
    Unknown(String),
    /// Command for invalid input, encapsulating an error message as a `String`.
    Invalid(String),
    /// Command for an empty input.
    Empty,
}

impl Command {
    /// Parses a string into a `Command` instance.
    ///
    /// The command keyword is case-insensitive. Arguments are kept as typed.
    ///
    /// # Parameters
    /// - `s`: A string slice representing the user input.
    ///
    /// # Returns
    /// - `Command::Quit` if the input is "quit".
    /// - `Command::Open` with the file path if the input starts with "open" followed by an
    ///   argument.
    /// - `Command::Info`, `Command::Dir`, `Command::Layout`, `Command::Skip`, `Command::Put` for
    ///   "info", "dir", "layout", "skip" and "put".
    /// - `Command::Cd` with the path if the input starts with "cd" followed by an argument.
    /// - `Command::Get` with the file name if the input starts with "get" followed by an argument.
    /// - `Command::Unknown` if the input does not match any known command.
    /// - `Command::Invalid` if a command is missing its argument.
    /// - `Command::Empty` if the input is empty or contains only whitespace.
    pub fn from_string(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        let keyword = match parts.next() {
            Some(keyword) => keyword.to_ascii_lowercase(),
            None => return Command::Empty,
        };

        match keyword.as_str() {
            "quit" => Command::Quit,
            "open" => match parts.next() {
                Some(arg) => Command::Open(arg.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'open' expects the path to a '.img' file.",
                )),
            },
            "info" => Command::Info,
            "dir" => Command::Dir,
            "cd" => match parts.next() {
                Some(arg) => Command::Cd(arg.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'cd' expects a directory name.",
                )),
            },
            "get" => match parts.next() {
                Some(arg) => Command::Get(arg.to_string()),
                None => Command::Invalid(String::from("Missing arg: 'get' expects a file name.")),
            },
            "layout" => Command::Layout,
            "skip" => Command::Skip,
            "put" => Command::Put,
            _ => Command::Unknown(keyword),
        }
    }
}
