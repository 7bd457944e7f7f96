/*
Copyright 2022 Volker Schwaberow <volker@schwaberow.de>
Permission is hereby granted, free of charge, to any person obtaining a
copy of this software and associated documentation files (the
"Software"), to deal in the Software without restriction, including without
limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the
Software is furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be
included in all copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT
SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR
OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE,
ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
DEALINGS IN THE SOFTWARE.
Author(s): Volker Schwaberow
*/

use dpicheck::cli::Cli;
use dpicheck::config::ConfigParameter;
use dpicheck::reporter::{Reporter, MAIN_PREFIX};
use dpicheck::runner::{run_batch, FINISHED_MARKER};
use dpicheck::suite::TestSuite;
use dpicheck::transfer::HttpTransfer;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::io::IsTerminal;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Warn).env().init() {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = Cli::parse_lenient(std::env::args_os());

    let mut config = ConfigParameter::new();
    config.set_timeout_ms(cli.timeout_ms());
    config.apply_overrides(|key| std::env::var(key).ok());
    config.set_inline_progress(std::io::stdout().is_terminal());

    let reporter = Reporter::stdout(config.inline_progress());

    match HttpTransfer::new(&config) {
        Ok(transfer) => {
            run_batch(Arc::new(transfer), &config, TestSuite::builtin(), reporter).await;
        }
        Err(e) => {
            let handle = reporter.handle();
            handle.message(MAIN_PREFIX, e.to_string());
            handle.message(MAIN_PREFIX, FINISHED_MARKER);
            drop(handle);
            reporter.finish().await;
        }
    }
}
