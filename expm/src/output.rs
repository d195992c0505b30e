//! Text rendering of the input and result matrices.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::matrix::Matrix;

/// Rows and columns beyond this are left out of the output.
pub const MAX_ENTRIES_TO_OUTPUT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Fixed point, `%7.4f`.
    Short,
    /// Scientific, `%11.4e` with a signed two-digit exponent.
    Long,
}

impl Format {
    fn render(self, value: f64) -> String {
        match self {
            Format::Short => format!(" {:7.4}", value),
            Format::Long => format!(" {:>11}", scientific(value)),
        }
    }
}

/// `1.2346e3` becomes `1.2346e+03`, the way C's `%e` prints it.
fn scientific(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.4e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => formatted,
        },
        None => formatted,
    }
}

/// Writes `name` on its own line, then the top-left corner of `m`.
///
/// Rows wider than [`MAX_ENTRIES_TO_OUTPUT`] end with ` ...`.
pub fn write_matrix<W: Write>(out: &mut W, name: &str, m: &Matrix, format: Format) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", name)?;

    let cols = m.cols().min(MAX_ENTRIES_TO_OUTPUT);
    for i in 0..m.rows().min(MAX_ENTRIES_TO_OUTPUT) {
        for value in &m.row(i)[..cols] {
            out.write_all(format.render(*value).as_bytes())?;
        }
        if m.cols() > MAX_ENTRIES_TO_OUTPUT {
            out.write_all(b" ...")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Input `A` in short format followed by the result `S` in long format.
pub fn write_report<W: Write>(out: &mut W, a: &Matrix, s: &Matrix) -> io::Result<()> {
    write_matrix(out, "A", a, Format::Short)?;
    write_matrix(out, "S", s, Format::Long)
}

/// Overwrites `path` with a timestamped header and the report.
pub fn save_report(path: &Path, a: &Matrix, s: &Matrix) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(
        out,
        "# exp(A) of order {}, written {}",
        a.rows(),
        chrono::Local::now().to_rfc3339()
    )?;
    write_report(&mut out, a, s)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(m: &Matrix, format: Format) -> String {
        let mut out = Vec::new();
        write_matrix(&mut out, "M", m, format).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn short_format_matches_fixed_point() {
        let m = Matrix::from_rows(&[vec![1.0, -0.5], vec![0.25, 12.34567]]).unwrap();
        assert_eq!(render(&m, Format::Short), "\nM\n  1.0000 -0.5000\n  0.2500 12.3457\n");
    }

    #[test]
    fn long_format_uses_c_exponent() {
        assert_eq!(scientific(1.0), "1.0000e+00");
        assert_eq!(scientific(-0.000123456), "-1.2346e-04");
        assert_eq!(scientific(2.5e120), "2.5000e+120");

        let m = Matrix::from_rows(&[vec![1.0, -1234.5]]).unwrap();
        assert_eq!(render(&m, Format::Long), "\nM\n  1.0000e+00 -1.2345e+03\n");
    }

    #[test]
    fn large_matrices_are_truncated() {
        let m = Matrix::identity(12);
        let text = render(&m, Format::Short);
        let lines: Vec<_> = text.lines().collect();

        // blank line, name, then ten rows
        assert_eq!(lines.len(), 2 + MAX_ENTRIES_TO_OUTPUT);
        assert!(lines[2..].iter().all(|l| l.ends_with(" ...")));
        assert_eq!(lines[2], format!("  1.0000{} ...", "  0.0000".repeat(9)));
    }

    #[test]
    fn report_file_has_header_and_both_matrices() {
        let path = std::env::temp_dir().join(format!("expm-report-{}.txt", std::process::id()));
        let a = Matrix::zeros(2, 2);
        let s = Matrix::identity(2);

        save_report(&path, &a, &s).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(text.starts_with("# exp(A) of order 2, written "));
        assert!(text.contains("\nA\n  0.0000  0.0000\n"));
        assert!(text.ends_with("\nS\n  1.0000e+00  0.0000e+00\n  0.0000e+00  1.0000e+00\n"));
    }
}
