// ==========================================
// 排班表文件 → 首次轮换月份 集成测试
// ==========================================

use crew_rotation::domain::cell_text;
use crew_rotation::engine::first_rotation::FIRST_ROTATION_COLUMN;
use crew_rotation::importer::{ImportError, UniversalGridParser};
use crew_rotation::{FirstRotationDeriver, ScheduleGrid};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn first_rotation(grid: &ScheduleGrid) -> Vec<String> {
    grid.rows
        .iter()
        .map(|r| r.get(FIRST_ROTATION_COLUMN).and_then(cell_text).unwrap_or_default())
        .collect()
}

const SCHEDULE_CSV: &str = "\
index,JAN 2026,Feb 2025,Desember 2024,Remarks
A,A,B,,x
B,,A,,
C,,,,catatan
D,D,,d,
";

#[test]
fn test_derive_from_csv_schedule() {
    let file = write_csv(SCHEDULE_CSV);
    let mut grid = UniversalGridParser.parse(file.path()).unwrap();
    assert_eq!(grid.rows.len(), 4);

    let resolved = FirstRotationDeriver::annotate(&mut grid);
    assert_eq!(resolved, 3);
    assert_eq!(first_rotation(&grid), vec!["02-2025", "02-2025", "-", "12-2024"]);
    assert_eq!(grid.columns.last().map(String::as_str), Some(FIRST_ROTATION_COLUMN));
}

#[test]
fn test_derive_twice_is_idempotent() {
    let file = write_csv(SCHEDULE_CSV);
    let mut grid = UniversalGridParser.parse(file.path()).unwrap();

    FirstRotationDeriver::annotate(&mut grid);
    let once = grid.clone();
    FirstRotationDeriver::annotate(&mut grid);

    assert_eq!(grid, once);
    assert_eq!(
        grid.columns
            .iter()
            .filter(|c| c.as_str() == FIRST_ROTATION_COLUMN)
            .count(),
        1
    );
}

#[test]
fn test_unrecognized_headers_yield_placeholder() {
    let file = write_csv("index,Kapal,Catatan\nA,KM Kelud,A\nB,KM Lawit,\n");
    let mut grid = UniversalGridParser.parse(file.path()).unwrap();

    assert_eq!(FirstRotationDeriver::annotate(&mut grid), 0);
    assert_eq!(first_rotation(&grid), vec!["-", "-"]);
}

#[test]
fn test_unsupported_extension_rejected() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"index\nA\n").unwrap();

    let err = UniversalGridParser.parse(file.path()).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(_)));
}
