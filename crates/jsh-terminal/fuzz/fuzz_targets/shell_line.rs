#![no_main]

use libfuzzer_sys::fuzz_target;
use jsh_terminal::Shell;
use jsh_types::config::ShellConfig;
use jsh_types::io::NullSink;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // A session must survive any line: faults end up as exit codes.
        let Ok(mut shell) =
            Shell::new(ShellConfig::default(), Box::new(NullSink), Box::new(NullSink))
        else {
            return;
        };
        for line in input.lines() {
            let _code = shell.execute(line);
        }
    }
});
