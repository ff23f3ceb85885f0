// Integration tests
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;
use uutests::util::TestScenario;
use uutests::util_name;
use uutests::{at_and_ucmd, new_ucmd};

// Test application's invocation
#[test]
fn test_invalid_arg() {
    new_ucmd!().arg("--definitely-invalid").fails().code_is(4);
}

#[test]
fn test_help() {
    new_ucmd!()
        .arg("--help")
        .succeeds()
        .stdout_contains("Stream editor");
}

#[test]
fn test_debug() {
    new_ucmd!()
        .args(&["--debug", "p"])
        .pipe_in("x\n")
        .succeeds()
        .stdout_contains("SED PROGRAM:\n  p\n")
        .stdout_contains("COMMAND: p\n");
}

#[test]
fn test_silent_alias() {
    new_ucmd!()
        .args(&["--silent", "p"])
        .pipe_in("a\n")
        .succeeds()
        .stdout_is("a\n");
}

#[test]
fn test_missing_script_argument() {
    new_ucmd!()
        .fails()
        .code_is(4)
        .stderr_contains("missing script");
}

#[test]
fn test_empty_positional_script_ok() {
    new_ucmd!().arg("").pipe_in("a\nb").succeeds().stdout_is("a\nb");
}

#[test]
fn test_f_script_ok() {
    let mut temp = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(temp, "s/a/b/").expect("Failed to write to temp file");
    let path = temp.path();

    new_ucmd!()
        .arg("-f")
        .arg(path)
        .pipe_in("a\n")
        .succeeds()
        .stdout_is("b\n");
}

#[test]
fn test_script_file_quiet_marker() {
    let mut temp = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(temp, "#n\n2p").expect("Failed to write to temp file");

    new_ucmd!()
        .arg("-f")
        .arg(temp.path())
        .pipe_in("1\n2\n3\n")
        .succeeds()
        .stdout_is("2\n");
}

#[test]
fn test_expression_order() {
    new_ucmd!()
        .args(&["-e", "s/a/b/", "-e", "s/b/c/"])
        .pipe_in("a\n")
        .succeeds()
        .stdout_is("c\n");
}

#[test]
fn test_expressions_joined_by_newline() {
    new_ucmd!()
        .args(&["-e", "1a\\", "-e", "appended"])
        .pipe_in("x\n")
        .succeeds()
        .stdout_is("x\nappended\n");
}

// The documented scenarios
#[test]
fn test_global_substitution() {
    new_ucmd!()
        .arg("s/a/b/g")
        .pipe_in("aaa\n")
        .succeeds()
        .stdout_is("bbb\n");
}

#[test]
fn test_delete_range() {
    new_ucmd!()
        .arg("1,3d")
        .pipe_in("1\n2\n3\n4\n5\n")
        .succeeds()
        .stdout_is("4\n5\n");
}

#[test]
fn test_next_print_delete() {
    new_ucmd!()
        .arg("N;P;D")
        .pipe_in("x\ny\nz\n")
        .succeeds()
        .stdout_is("x\ny\nz\n");
}

#[test]
fn test_join_lines_with_loop() {
    new_ucmd!()
        .arg(":a;$!{N;ba};s/\\n/+/g")
        .pipe_in("a\nb\nc\n")
        .succeeds()
        .stdout_is("a+b+c\n");
}

#[test]
fn test_empty_match_advance() {
    new_ucmd!()
        .arg("s/x*/-/g")
        .pipe_in("abc")
        .succeeds()
        .stdout_is("-a-b-c-");
}

// Exit codes
#[test]
fn test_compile_error() {
    new_ucmd!()
        .arg("k")
        .pipe_in("a\n")
        .fails()
        .code_is(1)
        .no_stdout()
        .stderr_contains("unknown command: `k'");
}

#[test]
fn test_undefined_label() {
    new_ucmd!()
        .arg("b nowhere")
        .fails()
        .code_is(1)
        .stderr_contains("can't find label for jump to `nowhere'");
}

#[test]
fn test_unmatched_brace() {
    new_ucmd!()
        .arg("1{p")
        .fails()
        .code_is(1)
        .stderr_contains("unmatched `{'");
}

#[test]
fn test_unreadable_input_continues() {
    let (at, mut ucmd) = at_and_ucmd!();
    at.write("one", "1\n");
    at.write("three", "3\n");

    ucmd.args(&["s/^/>/", "one", "missing", "three"])
        .fails()
        .code_is(2)
        .stdout_is(">1\n>3\n")
        .stderr_contains("can't read 'missing'");
}

#[test]
fn test_quit_exit_code() {
    new_ucmd!()
        .arg("2q5")
        .pipe_in("1\n2\n3\n")
        .fails()
        .code_is(5)
        .stdout_is("1\n2\n");
}

// Addresses
#[test]
fn test_last_line_across_files() {
    let (at, mut ucmd) = at_and_ucmd!();
    at.write("a", "1\n2\n");
    at.write("b", "3\n");

    ucmd.args(&["-n", "$p", "a", "b"]).succeeds().stdout_is("3\n");
}

#[test]
fn test_separate_files() {
    let (at, mut ucmd) = at_and_ucmd!();
    at.write("a", "1\n2\n");
    at.write("b", "3\n");

    ucmd.args(&["-s", "-n", "1p;$=", "a", "b"])
        .succeeds()
        .stdout_is("1\n2\n3\n1\n");
}

#[test]
fn test_regex_range() {
    new_ucmd!()
        .args(&["-n", "/start/,/end/p"])
        .pipe_in("a\nstart\nb\nend\nc\n")
        .succeeds()
        .stdout_is("start\nb\nend\n");
}

#[test]
fn test_relative_range_negated() {
    new_ucmd!()
        .arg("2,+1!d")
        .pipe_in("1\n2\n3\n4\n")
        .succeeds()
        .stdout_is("2\n3\n");
}

#[test]
fn test_custom_delimiter_address() {
    new_ucmd!()
        .args(&["-n", "\\,a/b,p"])
        .pipe_in("a/b\nab\n")
        .succeeds()
        .stdout_is("a/b\n");
}

#[test]
fn test_case_insensitive() {
    new_ucmd!()
        .args(&["-n", "/abc/Ip"])
        .pipe_in("ABC\nxyz\n")
        .succeeds()
        .stdout_is("ABC\n");
    new_ucmd!()
        .arg("s/abc/x/gI")
        .pipe_in("aBc-ABC\n")
        .succeeds()
        .stdout_is("x-x\n");
}

// Substitution
#[test]
fn test_groups_and_occurrence() {
    new_ucmd!()
        .arg("s/\\([a-z]\\)\\([0-9]\\)/\\2\\1/2")
        .pipe_in("a1 b2 c3\n")
        .succeeds()
        .stdout_is("a1 2b c3\n");
}

#[test]
fn test_extended_regex() {
    new_ucmd!()
        .args(&["-E", "s/(a|b)+/<&>/"])
        .pipe_in("xaabby\n")
        .succeeds()
        .stdout_is("x<aabb>y\n");
}

#[test]
fn test_back_reference_in_pattern() {
    new_ucmd!()
        .args(&["-n", "/\\(.\\)\\1/p"])
        .pipe_in("abc\naab\n")
        .succeeds()
        .stdout_is("aab\n");
}

#[test]
fn test_substitution_write_file() {
    let (at, mut ucmd) = at_and_ucmd!();
    ucmd.args(&["-n", "s/a/A/w out"])
        .pipe_in("a\nb\nca\n")
        .succeeds()
        .no_stdout();
    assert_eq!(at.read("out"), "A\ncA\n");
}

#[test]
fn test_write_command_shares_file() {
    let (at, mut ucmd) = at_and_ucmd!();
    ucmd.args(&["-e", "/1/w out", "-e", "/3/w out"])
        .pipe_in("1\n2\n3\n")
        .succeeds()
        .stdout_is("1\n2\n3\n");
    assert_eq!(at.read("out"), "1\n3\n");
}

#[test]
fn test_read_write_conflict() {
    new_ucmd!()
        .args(&["-e", "r same", "-e", "w same"])
        .fails()
        .code_is(1)
        .stderr_contains("couldn't both read and write");
}

#[test]
fn test_read_file() {
    let (at, mut ucmd) = at_and_ucmd!();
    at.write("insert", "inserted\n");
    ucmd.arg("1r insert")
        .pipe_in("a\nb\n")
        .succeeds()
        .stdout_is("a\ninserted\nb\n");
}

#[test]
fn test_sandbox() {
    new_ucmd!()
        .args(&["--sandbox", "w out"])
        .fails()
        .code_is(1)
        .stderr_contains("disabled in sandbox mode");
}

// Text and buffers
#[test]
fn test_insert_append_change() {
    new_ucmd!()
        .arg("1i\\\nfirst\n2c\\\nsecond\n$a\\\nlast")
        .pipe_in("a\nb\nc\n")
        .succeeds()
        .stdout_is("first\na\nsecond\nc\nlast\n");
}

#[test]
fn test_hold_reverse() {
    new_ucmd!()
        .arg("1!G;h;$!d")
        .pipe_in("1\n2\n3\n")
        .succeeds()
        .stdout_is("3\n2\n1\n");
}

#[test]
fn test_transliterate() {
    new_ucmd!()
        .arg("y/abc/ABC/")
        .pipe_in("aabbcc\n")
        .succeeds()
        .stdout_is("AABBCC\n");
}

#[test]
fn test_list() {
    new_ucmd!()
        .args(&["-n", "-l", "6", "l"])
        .pipe_in("a\tbcdef\n")
        .succeeds()
        .stdout_is("a\\tbc\\\ndef$\n");
}

#[test]
fn test_line_numbers() {
    new_ucmd!()
        .args(&["-n", "$="])
        .pipe_in("a\nb\nc\n")
        .succeeds()
        .stdout_is("3\n");
}

#[test]
fn test_null_data() {
    new_ucmd!()
        .args(&["-z", "s/^/>/"])
        .pipe_in("a\0b\0")
        .succeeds()
        .stdout_is(">a\0>b\0");
}

#[test]
fn test_missing_newline_preserved() {
    new_ucmd!()
        .arg("p")
        .pipe_in("a\nb")
        .succeeds()
        .stdout_is("a\na\nb\nb");
}

#[test]
fn test_input_from_file_and_stdin() {
    let (at, mut ucmd) = at_and_ucmd!();
    at.write("f", "file\n");
    ucmd.args(&["s/^/>/", "f", "-"])
        .pipe_in("stdin\n")
        .succeeds()
        .stdout_is(">file\n>stdin\n");
}

#[test]
fn test_output_file_created_before_input() {
    let (at, mut ucmd) = at_and_ucmd!();
    ucmd.args(&["-n", "w created"]).pipe_in("").succeeds();
    assert!(at.file_exists("created"));
    assert_eq!(fs::read_to_string(at.plus("created")).unwrap(), "");
}
