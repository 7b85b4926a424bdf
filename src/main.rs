//! isotest-demo - a test program built on isotest
//!
//! Its suites cover every outcome a run can produce, and the integration
//! tests drive this binary end to end.
//!
//! ## Usage
//!
//! ```bash
//! # Run the suites that finish quickly
//! isotest-demo -t math/ && isotest-demo -t crashes/ && isotest-demo -t output/
//!
//! # Run the timeout case with a one second limit
//! isotest-demo -t slow/ -l 1
//!
//! # List every qualified test path
//! isotest-demo --list
//! ```

use anyhow::{bail, ensure};
use std::process::ExitCode;
use std::time::Duration;

use isotest::{Suite, TestCase};

fn math() -> Suite {
    Suite::new("math")
        .with_test("add_ok", || {
            ensure!(2 + 2 == 4, "addition is broken");
            Ok(())
        })
        .with_test("div_by_zero", || {
            let divisor = std::hint::black_box(0);
            match 10_i32.checked_div(divisor) {
                Some(_) => Ok(()),
                None => bail!("division by zero"),
            }
        })
}

fn crashes() -> Suite {
    Suite::new("crashes")
        .with_test("abort", || std::process::abort())
        .with_test("exit", || std::process::exit(3))
        .with_test("panics", || {
            let values: Vec<i32> = Vec::new();
            assert!(!values.is_empty(), "expected at least one value");
            Ok(())
        })
        .with_test("opaque_panic", || std::panic::panic_any(7_u8))
        .with_test("multiline", || bail!("first line\nsecond line"))
}

fn slow() -> Suite {
    Suite::new("slow")
        .with_test("hang", || loop {
            std::thread::sleep(Duration::from_secs(1));
        })
        .with_test("brief", || {
            std::thread::sleep(Duration::from_millis(100));
            Ok(())
        })
}

fn output() -> Suite {
    Suite::new("output").with_test("chatty", || {
        println!("progress: step 1");
        print!("progress: step 2 ");
        eprintln!("progress on stderr");
        Ok(())
    })
}

fn nested() -> Suite {
    Suite::new("outer")
        .with_suite(
            Suite::new("inner")
                .with_test("a", || Ok(()))
                .with_test("b", || Ok(())),
        )
        .with_case(TestCase::new("c", || Ok(())))
}

fn many() -> Suite {
    (0..20).fold(Suite::new("many"), |suite, i| {
        suite.with_test(format!("case_{i:02}"), move || {
            ensure!(i * i >= i, "square of {} is smaller than itself", i);
            Ok(())
        })
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let suites = vec![math(), crashes(), slow(), output(), nested(), many()];
    isotest::run(suites).await
}
