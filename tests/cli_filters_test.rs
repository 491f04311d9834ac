use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn run(bin: &str, args: &[&str], stdin: &str) -> anyhow::Result<Output> {
    let mut child = Command::new(bin)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let written = child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes());
    // binaries that fail argument validation exit before reading stdin
    if let Err(e) = written {
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            return Err(e.into());
        }
    }
    Ok(child.wait_with_output()?)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_normalize_binary() -> anyhow::Result<()> {
    let output = run(
        env!("CARGO_BIN_EXE_normalize"),
        &[],
        "tid\texp1\texp2\ngene1\t1\t2\ngene2\t3\t6\n",
    )?;
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "tid\texp1\texp2\ngene1\t0.25\t0.25\ngene2\t0.75\t0.75\n"
    );
    Ok(())
}

#[test]
fn test_normalize_rejects_text_with_input_exit_code() -> anyhow::Result<()> {
    let output = run(env!("CARGO_BIN_EXE_normalize"), &[], "tid\ta\nr1\tabc\n")?;
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("'abc'").count(), 1, "stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_transpose_binary_pads_ragged_rows() -> anyhow::Result<()> {
    let output = run(env!("CARGO_BIN_EXE_transpose"), &[], "a\tb\tc\nd\te\n")?;
    assert!(output.status.success());
    assert_eq!(stdout(&output), "a\td\nb\te\nc\t\n");
    Ok(())
}

#[test]
fn test_vitals_binary() -> anyhow::Result<()> {
    let output = run(
        env!("CARGO_BIN_EXE_vitals"),
        &[],
        "1\n2\nnot a number\n\n3\n4\n5\n",
    )?;
    assert!(output.status.success());
    let text = stdout(&output);
    let cells: Vec<&str> = text.trim_end().split('\t').collect();
    assert_eq!(cells[0], "15.0");
    assert_eq!(cells[1], "3.0");
    let stdev: f64 = cells[2].parse()?;
    assert!((stdev - 1.58114).abs() < 1e-5);
    Ok(())
}

#[test]
fn test_report_binary_tsv_and_rst() -> anyhow::Result<()> {
    let input = "id\tx\ty\nr1\t1\t2\nr2\tcat\t\n";

    let tsv = run(env!("CARGO_BIN_EXE_report"), &[], input)?;
    assert!(tsv.status.success());
    assert_eq!(
        stdout(&tsv),
        "row\ttype\t#missing\tsum or #values\nr1\tnumeric\t0\t3\nr2\tcategorical\t1\t2\n"
    );

    let rst = run(env!("CARGO_BIN_EXE_report"), &["--format", "rst"], input)?;
    assert!(rst.status.success());
    let text = stdout(&rst);
    assert!(text.contains("Report"));
    assert!(text.contains("The maximum value was: 2"));
    Ok(())
}

#[test]
fn test_grep_rows_binary() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let ids = dir.path().join("ids.txt");
    std::fs::write(&ids, "b\nd\n")?;
    let ids = ids.to_string_lossy().into_owned();
    let data = "a\t1\nb\t2\nc\t3\nd\t4\n";

    let output = run(env!("CARGO_BIN_EXE_grep_rows"), &[&ids], data)?;
    assert_eq!(stdout(&output), "b\t2\nd\t4\n");

    let output = run(env!("CARGO_BIN_EXE_grep_rows"), &["-f", &ids], data)?;
    assert_eq!(stdout(&output), "a\t1\nc\t3\n");
    Ok(())
}

#[test]
fn test_subsample_binary_bounds() -> anyhow::Result<()> {
    let input = "one\ntwo\nthree\n";

    let all = run(env!("CARGO_BIN_EXE_subsample"), &["-f", "1"], input)?;
    assert_eq!(stdout(&all), input);

    let none = run(env!("CARGO_BIN_EXE_subsample"), &["-f", "0"], input)?;
    assert!(none.status.success());
    assert!(stdout(&none).is_empty());

    let invalid = run(env!("CARGO_BIN_EXE_subsample"), &["-f", "1.5"], input)?;
    assert_eq!(invalid.status.code(), Some(2));
    Ok(())
}

#[test]
fn test_generate_random_table_is_reproducible_with_seed() -> anyhow::Result<()> {
    let args = ["-r", "3", "-c", "2", "-f", "10", "--seed", "7"];
    let first = run(env!("CARGO_BIN_EXE_generate_random_table"), &args, "")?;
    let second = run(env!("CARGO_BIN_EXE_generate_random_table"), &args, "")?;
    assert!(first.status.success());
    assert_eq!(stdout(&first), stdout(&second));

    let text = stdout(&first);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("R000010\t"));
    assert!(lines[3].starts_with("R000012\t"));
    Ok(())
}

#[test]
fn test_merge_tables_binary_with_labels() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let left = dir.path().join("left.pcl");
    let right = dir.path().join("right.pcl");
    let merged = dir.path().join("out/merged.pcl");
    std::fs::write(&left, "id\tv\nr1\t1\nr2\t2\n")?;
    std::fs::write(&right, "id\tw\nr2\t20\nr3\t30\n")?;

    let output = run(
        env!("CARGO_BIN_EXE_merge_tables"),
        &[
            "-l",
            "-o",
            &merged.to_string_lossy(),
            &left.to_string_lossy(),
            &right.to_string_lossy(),
        ],
        "",
    )?;
    assert!(output.status.success());
    assert_eq!(
        std::fs::read_to_string(&merged)?,
        "id\tleft:v\tright:w\nr1\t1\t\nr2\t2\t20\nr3\t\t30\n"
    );
    Ok(())
}

#[test]
fn test_merge_tables_rejects_transpose_without_header() -> anyhow::Result<()> {
    let output = run(
        env!("CARGO_BIN_EXE_merge_tables"),
        &["-t", "-d", "missing.pcl"],
        "",
    )?;
    assert!(!output.status.success());
    Ok(())
}
