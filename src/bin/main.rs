//! This is the main entry point for the FAT32 volume explorer.
//!
//! The program provides an interactive command-line interface for navigating FAT32 volume images.
//! Users can open an image, list and change directories, copy files out of the volume and print
//! the volume information and layout.
//!
//! Usage: `main [-v...] [IMAGE]`. Each `-v` raises the log verbosity.

use fat_explorer::commands::Command;
use fat_explorer::traits::LayoutDisplay;
use fat_explorer::{FATError, FATVol, SessionState};
use log::{error, warn};
use std::{
    env,
    fs::File,
    io::{self, Write},
    path::Path,
};

/// Represents the runtime state of the program.
///
/// This struct keeps track of the opened volume and of the current directory.
struct RunState {
    /// The currently opened volume.
    volume: Option<FATVol<File>>,
    /// State of the last session brought up
    state: SessionState,
    /// First cluster of the current directory
    cwd_cluster: u32,
    /// Names of the directories from the root to the current one
    cwd_path: Vec<String>,
    /// Enable the validation of the bpb
    bpb_validation: bool,
}

impl RunState {
    fn prompt(&self) -> String {
        match &self.volume {
            Some(_) => format!("/{}> ", self.cwd_path.join("/")),
            None => String::from("> "),
        }
    }

    /// Returns the opened volume, if its session is ready.
    fn ready_volume(&mut self) -> Option<&mut FATVol<File>> {
        if !self.state.is_ready() {
            warn!("Open a volume image first");
            return None;
        }
        self.volume.as_mut()
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let verbosity = args.iter().filter(|arg| arg.as_str() == "-v").count();

    if let Err(err) = stderrlog::new()
        .module(module_path!())
        .module("fat_explorer")
        .verbosity(verbosity + 1)
        .init()
    {
        eprintln!("Failed to initialise logging: {err}");
    }

    let mut run_state = RunState {
        volume: None,
        state: SessionState::Unloaded,
        cwd_cluster: 0,
        cwd_path: Vec::new(),
        bpb_validation: true,
    };

    if let Some(path) = args.iter().find(|arg| !arg.starts_with('-')) {
        open_volume(&mut run_state, Path::new(path));
    }

    loop {
        print!("{}", run_state.prompt());
        if let Err(err) = io::stdout().flush() {
            error!("Failed to flush stdout: {err}");
        }

        let mut s = String::new();
        match io::stdin().read_line(&mut s) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                error!("Failed to read command: {err}");
                break;
            }
        }

        match Command::from_string(&s) {
            Command::Open(path) => open_volume(&mut run_state, Path::new(&path)),
            Command::Quit => break,
            Command::Info => print_info(&mut run_state),
            Command::Dir => list_current_dir(&mut run_state),
            Command::Cd(path) => change_dir(&mut run_state, &path),
            Command::Get(name) => {
                let cwd = run_state.cwd_cluster;
                if let Some(vol) = run_state.ready_volume() {
                    match vol.retrieve(cwd, &name, Path::new(".")) {
                        Ok((path, written)) => {
                            println!("Retrieved {} ({written} bytes)", path.display())
                        }
                        Err(err) => error!("Get failed: {err}"),
                    }
                }
            }
            Command::Layout => {
                if let Some(vol) = run_state.ready_volume() {
                    match vol.display_layout(3) {
                        Ok(layout) => print!("{layout}"),
                        Err(err) => error!("Layout printing failed: {err}"),
                    }
                }
            }
            Command::Skip => {
                run_state.bpb_validation = false;
                println!("Strict Bpb validation disabled for the next open");
            }
            Command::Put => warn!("Writing to the volume is not supported"),
            Command::Unknown(s) => error!("Unknown command: {s:?}"),
            Command::Invalid(s) => error!("{s}"),
            Command::Empty => {}
        }
    }
}

fn open_volume(run_state: &mut RunState, path: &Path) {
    run_state.volume = None;

    let opened = match File::open(path) {
        Ok(file) => FATVol::open_with_state(file, run_state.bpb_validation, &mut run_state.state),
        Err(err) => {
            run_state.state = SessionState::Failed;
            Err(FATError::from(err))
        }
    };

    match opened {
        Ok(vol) => {
            run_state.cwd_cluster = vol.root_cluster();
            run_state.cwd_path.clear();
            run_state.volume = Some(vol);
        }
        Err(err) => error!("Can't open {}: {err}", path.display()),
    }
}

fn print_info(run_state: &mut RunState) {
    let vol = match run_state.ready_volume() {
        Some(vol) => vol,
        None => return,
    };

    print!("{}", vol.bpb());
    match vol.volume_label() {
        Ok(label) => println!("{:<24}{}", "Volume label:", label),
        Err(err) => error!("Can't read the volume label: {err}"),
    }
    println!("{:<24}{}", "Data clusters:", vol.region().cluster_count());
    match vol.free_bytes() {
        Some(bytes) => println!("{:<24}{} bytes", "Free space:", bytes),
        None => println!("{:<24}unknown", "Free space:"),
    }
    if let Some(cluster) = vol.fs_info().next_free() {
        println!("{:<24}{}", "Next free cluster:", cluster);
    }
}

fn list_current_dir(run_state: &mut RunState) {
    let cwd = run_state.cwd_cluster;
    let vol = match run_state.ready_volume() {
        Some(vol) => vol,
        None => return,
    };

    let entries = match vol.list_dir(cwd) {
        Ok(entries) => entries,
        Err(err) => {
            error!("Listing failed: {err}");
            return;
        }
    };

    for entry in &entries {
        println!("{entry}");
    }

    let dirs = entries
        .iter()
        .filter(|entry| entry.is_dir() && !entry.is_dot_entry())
        .count();
    let files = entries.iter().filter(|entry| !entry.is_dir()).count();
    println!("{files} file(s), {dirs} dir(s)");
}

/// Follows `path` from the current directory, or from the root if it starts with `/`.
///
/// The current directory is left untouched if any component fails to resolve.
fn change_dir(run_state: &mut RunState, path: &str) {
    let (mut cluster, mut names) = (run_state.cwd_cluster, run_state.cwd_path.clone());
    let vol = match run_state.ready_volume() {
        Some(vol) => vol,
        None => return,
    };

    if path.starts_with('/') {
        cluster = vol.root_cluster();
        names.clear();
    }

    for name in path.split('/').filter(|name| !name.is_empty()) {
        match vol.resolve_child(cluster, name) {
            Ok(child) => cluster = child,
            Err(err) => {
                error!("cd failed: {err}");
                return;
            }
        }

        match name {
            "." => {}
            ".." => names.clear(),
            _ => names.push(name.to_ascii_uppercase()),
        }
    }

    run_state.cwd_cluster = cluster;
    run_state.cwd_path = names;
}
