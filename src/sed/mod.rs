// Program entry point and CLI processing
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

pub mod command;
pub mod compiler;
pub mod debug;
pub mod delimited_parser;
pub mod error_handling;
pub mod fast_io;
pub mod fast_regex;
pub mod label_resolver;
pub mod multi_io;
pub mod named_writer;
pub mod processor;
pub mod regex_translator;
pub mod script_char_provider;
pub mod script_line_provider;
pub mod space;
pub mod substitution;

use crate::sed::command::{DEFAULT_LINE_LENGTH, ProcessingOptions};
use crate::sed::compiler::compile;
use crate::sed::error_handling::EXIT_PANIC;
use crate::sed::processor::process_all_files;
use crate::sed::script_line_provider::ScriptValue;

use clap::{Arg, ArgMatches, Command, arg};
use std::path::PathBuf;
use uucore::error::{UClapError, UResult, UUsageError};
use uucore::{crate_version, format_usage};

const ABOUT: &str = "Stream editor for filtering and transforming text";
const USAGE: &str = "rsed [OPTION]... [script] [file]...";

#[uucore::main]
pub fn uumain(args: impl uucore::Args) -> UResult<()> {
    let matches = uu_app()
        .try_get_matches_from(args)
        .with_exit_code(EXIT_PANIC)?;
    let (scripts, files) = get_scripts_files(&matches)?;
    let mut options = build_options(&matches);

    let mut program = compile(scripts, &mut options)?;
    process_all_files(&mut program, files, &options)
}

pub fn uu_app() -> Command {
    Command::new(uucore::util_name())
        .version(crate_version!())
        .about(ABOUT)
        .override_usage(format_usage(USAGE))
        .infer_long_args(true)
        .args([
            arg!([script] "Script to execute if not otherwise provided."),
            Arg::new("file")
                .help("Input files")
                .value_parser(clap::value_parser!(PathBuf))
                .num_args(0..),
            arg!(--debug "Annotate program execution."),
            Arg::new("regexp-extended")
                .short('E')
                .long("regexp-extended")
                .short_alias('r')
                .help("Use extended regular expressions.")
                .action(clap::ArgAction::SetTrue),
            arg!(-e --expression <SCRIPT> "Add script to executed commands.")
                .action(clap::ArgAction::Append),
            // Access with .get_many::<PathBuf>("script-file")
            Arg::new("script-file")
                .short('f')
                .long("file")
                .alias("script-file")
                .value_name("FILE")
                .help("Add the contents of the script file to executed commands.")
                .value_parser(clap::value_parser!(PathBuf))
                .action(clap::ArgAction::Append),
            // Access with .get_one::<usize>("line-length")
            Arg::new("line-length")
                .short('l')
                .long("line-length")
                .value_name("NUM")
                .help("Specify the 'l' command line-wrap length.")
                .value_parser(clap::value_parser!(usize)),
            arg!(-n --quiet "Suppress automatic printing of pattern space.").aliases(["silent"]),
            arg!(--posix "Disable all POSIX extensions."),
            arg!(-s --separate "Consider files as separate rather than as a long stream."),
            arg!(--sandbox "Operate in a sandbox by disabling r/w commands."),
            arg!(-u --unbuffered "Flush output buffers after every cycle."),
            Arg::new("null-data")
                .short('z')
                .long("null-data")
                .help("Separate lines by NUL characters.")
                .action(clap::ArgAction::SetTrue),
        ])
}

// Iterate through script and file arguments specified in matches and
// return vectors of all scripts and input files in the specified order.
// If no script is specified fail with "missing script" error.
fn get_scripts_files(matches: &ArgMatches) -> UResult<(Vec<ScriptValue>, Vec<PathBuf>)> {
    let mut indexed_scripts: Vec<(usize, ScriptValue)> = Vec::new();
    let mut files: Vec<PathBuf> = Vec::new();

    let script_through_options =
        matches.contains_id("expression") || matches.contains_id("script-file");

    if script_through_options {
        // sed [-En] -e script [-e script]... [-f script_file]... [file...]
        // The clap script argument is actually an input file.
        if let Some(val) = matches.get_one::<String>("script") {
            files.push(PathBuf::from(val));
        }
    } else {
        // sed [-En] script [file...]
        match matches.get_one::<String>("script") {
            Some(val) => indexed_scripts.push((0, ScriptValue::StringVal(val.to_owned()))),
            None => return Err(UUsageError::new(EXIT_PANIC, "missing script")),
        }
    }

    if let Some(indices) = matches.indices_of("expression") {
        for (idx, val) in indices.zip(matches.get_many::<String>("expression").unwrap_or_default())
        {
            indexed_scripts.push((idx, ScriptValue::StringVal(val.to_owned())));
        }
    }

    if let Some(indices) = matches.indices_of("script-file") {
        for (idx, val) in indices.zip(
            matches
                .get_many::<PathBuf>("script-file")
                .unwrap_or_default(),
        ) {
            indexed_scripts.push((idx, ScriptValue::PathVal(val.to_owned())));
        }
    }

    // Preserve the command-line order of -e and -f.
    indexed_scripts.sort_by_key(|k| k.0);
    let scripts = indexed_scripts
        .into_iter()
        .map(|(_, value)| value)
        .collect();

    files.extend(
        matches
            .get_many::<PathBuf>("file")
            .unwrap_or_default()
            .cloned(),
    );

    // Read from stdin if no file has been specified.
    if files.is_empty() {
        files.push(PathBuf::from("-"));
    }

    Ok((scripts, files))
}

// Return the processing options specified through the command line.
fn build_options(matches: &ArgMatches) -> ProcessingOptions {
    ProcessingOptions {
        debug: matches.get_flag("debug"),
        regex_extended: matches.get_flag("regexp-extended"),
        length: matches
            .get_one::<usize>("line-length")
            .copied()
            .unwrap_or(DEFAULT_LINE_LENGTH),
        quiet: matches.get_flag("quiet"),
        posix: matches.get_flag("posix"),
        separate: matches.get_flag("separate"),
        sandbox: matches.get_flag("sandbox"),
        unbuffered: matches.get_flag("unbuffered"),
        null_data: matches.get_flag("null-data"),
    }
}
