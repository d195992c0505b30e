use std::env;
use std::io::{self, Write};

use expm::{ConfigError, Error, Matrix, MatrixExp, Params, save_report, usage, write_report};

fn report_usage<W: Write>(out: &mut W, program: &str, error: &ConfigError) -> io::Result<()> {
    writeln!(out, "{}", error)?;
    writeln!(out, "{}", usage(program))
}

/// Runs one computation for `args` (program name first), writing everything
/// meant for the user to `out`. Configuration errors are reported there and
/// are not failures.
async fn run<W: Write>(
    mut args: impl Iterator<Item = String>,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let program = args.next().unwrap_or_else(|| "expm".to_string());
    let params = match Params::parse(args) {
        Ok(params) => params,
        Err(e) => {
            report_usage(out, &program, &e)?;
            return Ok(());
        }
    };

    let a = Matrix::random(params.order, params.seed);
    let solution = match MatrixExp::new(params.expm_config()).compute(&a).await {
        Ok(solution) => solution,
        Err(Error::Config(e)) => {
            report_usage(out, &program, &e)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    writeln!(out, "Elapsed time: {:.6}s", solution.elapsed.as_secs_f64())?;
    writeln!(out, "Terms: {}", solution.last_term)?;

    write_report(out, &a, &solution.sum)?;
    save_report(&params.output, &a, &solution.sum)?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    run(env::args(), &mut io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> impl Iterator<Item = String> {
        line.split_whitespace()
            .map(String::from)
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[tokio::test]
    async fn order_below_workers_prints_usage_and_succeeds() {
        let path = env::temp_dir().join(format!("expm-unused-{}.txt", std::process::id()));
        let line = format!("expm -s 1 -n 3 -p 4 -o {}", path.display());

        let mut out = Vec::new();
        run(args(&line), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            format!(
                "Matrix order 3 is smaller than the number of workers 4\n{}\n",
                usage("expm")
            )
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_arguments_print_usage_and_succeed() {
        let mut out = Vec::new();
        run(args("expm -s 1"), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Required arguments missing.\n"));
        assert!(text.ends_with(&format!("{}\n", usage("expm"))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn successful_run_reports_and_saves() {
        let path = env::temp_dir().join(format!("expm-run-{}.txt", std::process::id()));
        let line = format!("expm -s 3 -n 4 -p 2 -o {}", path.display());

        let mut out = Vec::new();
        run(args(&line), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Elapsed time: "));
        assert!(text.contains("\nA\n"));
        assert!(text.contains("\nS\n"));

        let saved = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(saved.starts_with("# exp(A) of order 4, written "));
    }
}
