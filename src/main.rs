// main.rs — process entry for the vecadd demo.
//
// No flags: argv[0] is only echoed in the startup line. Exit code 0 on a
// complete, verified run; 1 on any failure. All device resources are
// released by drop before the process exits on either path.

use std::env;
use std::process::ExitCode;

use vecadd::driver::{self, DriverConfig};

fn main() -> ExitCode {
    // Surfaces wgpu's internal diagnostics under RUST_LOG.
    env_logger::init();

    let argv0 = env::args().next().unwrap_or_else(|| "vecadd".into());
    let config = DriverConfig::default();
    println!("{argv0} starting...");
    println!();
    println!("# of float elements per array = {}", config.num_elements);

    match driver::run(&config) {
        Ok(report) => {
            println!();
            for (i, chunk) in report.lane_preview.chunks(8).enumerate() {
                let line: Vec<String> = chunk
                    .iter()
                    .enumerate()
                    .map(|(j, v)| format!("lane_ids[{}]={v}", i * 8 + j))
                    .collect();
                println!("{}", line.join(" "));
            }
            println!();
            println!("Verified {} elements against the host reference: PASS", report.verified);
            println!("Adapter: {}", report.adapter);
            println!("Work:    {}", report.work);
            println!("Timings: {}", report.timings);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[vecadd] FATAL: {e}");
            // Walk the source chain so the underlying wgpu/io error is
            // visible, not just the step that wrapped it.
            let mut cause = std::error::Error::source(&e);
            while let Some(c) = cause {
                eprintln!("[vecadd]   caused by: {c}");
                cause = c.source();
            }
            ExitCode::FAILURE
        }
    }
}
