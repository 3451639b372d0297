//! End-to-end scans against the built binary, covering the six scenarios
//! named in the specification plus a couple of boundary cases.
//!
//! Grounded on the `assert_cmd`/`predicates` integration-test style (not
//! used by the teacher, whose own dev-dependencies are benchmark/vector
//! oriented; sourced instead from the Loctree example's CLI test suite,
//! recorded in DESIGN.md).

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn bin() -> Command {
    Command::cargo_bin("deserial-inspector").unwrap()
}

fn write(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn pickle_load_via_uploaded_file_stream_is_high() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "app.py",
        "\
import pickle
from flask import request

@app.route('/upload', methods=['POST'])
def upload():
    f = request.files['data']
    path = '/tmp/' + f.filename
    f.save(path)
    with open(path, 'rb') as handle:
        return pickle.load(handle)
",
    );

    bin()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("HIGH"));
}

#[test]
fn pickle_loads_via_request_form_is_high() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "handler.py",
        "\
import pickle
from flask import request

def handle():
    payload = request.form['payload']
    return pickle.loads(payload)
",
    );

    bin()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("HIGH"));
}

#[test]
fn pickle_load_via_pickle_named_constant_is_high() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "loader.py",
        "\
import pickle

def load_model():
    path = 'models/weights.pkl'
    with open(path, 'rb') as handle:
        return pickle.load(handle)
",
    );

    bin()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("HIGH"));
}

#[test]
fn yaml_load_via_open_wrapping_is_medium() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "config.py",
        "\
import yaml

def load_config(path):
    with open(path) as handle:
        return yaml.load(handle)
",
    );

    bin()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("MEDIUM"));
}

#[test]
fn pickle_load_via_os_path_join_constants_is_low() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "cache.py",
        "\
import pickle
import os

def load_cache():
    path = os.path.join('var', 'cache', 'state.bin')
    with open(path, 'rb') as handle:
        return pickle.load(handle)
",
    );

    bin()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("LOW"));
}

#[test]
fn http_endpoint_context_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "server.py",
        "\
import pickle
from flask import request

@app.route('/restore', methods=['POST'])
def restore():
    blob = request.data
    return pickle.loads(blob)
",
    );

    bin()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("/restore"));
}

#[test]
fn empty_directory_reports_no_python_files() {
    let dir = tempfile::tempdir().unwrap();
    bin()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No Python files found"));
}

#[test]
fn json_report_is_written_to_reports_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "app.py",
        "import pickle\npickle.loads(b'x')\n",
    );

    let cwd = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let result = bin().arg(".").arg("--json").assert().success();
    std::env::set_current_dir(cwd).unwrap();

    result.stdout(predicate::str::contains("JSON report written"));
    assert!(dir.path().join("reports").is_dir());
}
