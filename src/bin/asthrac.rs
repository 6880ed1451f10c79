//! Smoke-test harness over the `asthra` library: read a file, run the
//! pipeline, print diagnostics. Intentionally minimal — option parsing,
//! build/link orchestration, and toolchain integration are the external
//! driver's job, not this binary's (`spec.md` §1, `SPEC_FULL.md` §1).

use std::{env, fs, process};

use asthra::{compile_unit, CompileOptions};
use log::{error, info};

fn main() {
    simple_logger::init_with_level(log::Level::Info).ok();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        error!("usage: asthrac <file.ast>");
        process::exit(2);
    };

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) => {
            error!("failed to read {path}: {e}");
            process::exit(1);
        }
    };

    let options = CompileOptions { file_name: path.clone() };
    let output = compile_unit(&source, &options);

    for diag in &output.diagnostics {
        match serde_json::to_string(diag) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("failed to serialize diagnostic: {e}"),
        }
    }

    if let Some(module) = &output.ir {
        info!(
            "lowered {} function(s), {} declaration(s)",
            module.functions.len(),
            module.declarations.len()
        );
    }

    if output.has_errors() {
        process::exit(1);
    }
}
