//! Declarations file writer.
//!
//! Two layouts are supported:
//!
//! - v1: fixed four-line records per variable, no explicit array or flag markers
//! - v2: named, indented records with an optional `array` and `flags` line
//!
//! Both emit variables in field order, each nullable field preceded by its null
//! indicator, so the trace written for the same tables lines up with the declarations.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::config::ConfigError;
use crate::trace::constants::{NULL_INDICATOR_COMPARABILITY, NULL_INDICATOR_REP_TYPE};
use crate::trace::{Field, Table};

/// Declarations file format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclsVersion {
    V1,
    #[default]
    V2,
}

impl FromStr for DeclsVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "1.0" => Ok(DeclsVersion::V1),
            "2" | "2.0" => Ok(DeclsVersion::V2),
            other => Err(ConfigError::InvalidVersion(other.to_string())),
        }
    }
}

impl fmt::Display for DeclsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclsVersion::V1 => f.write_str("1.0"),
            DeclsVersion::V2 => f.write_str("2.0"),
        }
    }
}

/// One declared variable: a field or the null indicator in front of it.
struct VarDecl<'a> {
    name: &'a str,
    dec_type: &'a str,
    rep_type: &'a str,
    comparability: &'a str,
    is_array: bool,
    non_null: bool,
}

/// Variables declared for `field`, null indicator first.
fn variables(field: &Field) -> impl Iterator<Item = VarDecl<'_>> {
    let indicator = field.null_indicator().map(|name| VarDecl {
        name,
        dec_type: name,
        rep_type: NULL_INDICATOR_REP_TYPE,
        comparability: NULL_INDICATOR_COMPARABILITY,
        is_array: false,
        non_null: false,
    });
    let value = VarDecl {
        name: field.escaped_name(),
        dec_type: field.raw_type(),
        rep_type: field.rep_type().name(),
        comparability: field.comparability(),
        is_array: field.rep_type().is_array(),
        non_null: field.is_primary_key(),
    };
    indicator.into_iter().chain(std::iter::once(value))
}

/// Writes declarations for `tables` in the given format.
pub fn write_decls<W: Write>(out: &mut W, tables: &[Table], version: DeclsVersion) -> Result<()> {
    match version {
        DeclsVersion::V1 => write_decls_v1(out, tables),
        DeclsVersion::V2 => write_decls_v2(out, tables),
    }
}

/// Writes the v1 layout: `DECLARE`, the point name, then four lines per variable.
pub fn write_decls_v1<W: Write>(out: &mut W, tables: &[Table]) -> Result<()> {
    for table in tables {
        writeln!(out, "DECLARE")?;
        writeln!(out, "{}", table.point_name())?;
        for field in table.fields() {
            for var in variables(field) {
                writeln!(out, "{}", var.name)?;
                writeln!(out, "{}", var.dec_type)?;
                writeln!(out, "{}", var.rep_type)?;
                writeln!(out, "{}", var.comparability)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes the v2 layout with its `decl-version` header.
pub fn write_decls_v2<W: Write>(out: &mut W, tables: &[Table]) -> Result<()> {
    write!(out, "decl-version 2.0\ninput-language MySQL\n\n")?;
    for table in tables {
        writeln!(out, "ppt {}", table.point_name())?;
        writeln!(out, "ppt-type point")?;
        for field in table.fields() {
            for var in variables(field) {
                writeln!(out, "  variable {}", var.name)?;
                writeln!(out, "    var-kind variable")?;
                writeln!(out, "    dec-type {}", var.dec_type)?;
                writeln!(out, "    rep-type {}", var.rep_type)?;
                if var.is_array {
                    writeln!(out, "    array 1")?;
                }
                if var.non_null {
                    writeln!(out, "    flags non_null")?;
                }
                writeln!(out, "    comparability {}", var.comparability)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes a declarations file at `path`.
///
/// Returns `false` without touching the file when it exists and `overwrite` is unset.
pub fn write_decls_file(
    path: &Path,
    tables: &[Table],
    version: DeclsVersion,
    overwrite: bool,
) -> Result<bool> {
    if !overwrite && path.exists() {
        tracing::info!("Keeping existing declarations {}", path.display());
        return Ok(false);
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create declarations file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_decls(&mut out, tables, version)
        .with_context(|| format!("Failed to write declarations to {}", path.display()))?;
    out.flush()
        .with_context(|| format!("Failed to flush declarations file {}", path.display()))?;

    tracing::info!(
        "Wrote v{} declarations for {} tables to {}",
        version,
        tables.len(),
        path.display()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{ColumnInfo, TableSchema};
    use tempfile::TempDir;

    fn sample_table() -> Table {
        Table::from_schema(&TableSchema {
            name: "t".to_string(),
            columns: vec![
                ColumnInfo::new("id", "INT", true, true),
                ColumnInfo::new("name", "VARCHAR(10)", true, false),
            ],
        })
    }

    fn render(tables: &[Table], version: DeclsVersion) -> String {
        let mut out = Vec::new();
        write_decls(&mut out, tables, version).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_v1_layout() {
        let expected = "\
DECLARE
t:::POINT
t.id
INT
hashcode
2
t.name__IS_NULL__
t.name__IS_NULL__
hashcode
8
t.name
VARCHAR(10)
java.lang.String
1

";
        assert_eq!(render(&[sample_table()], DeclsVersion::V1), expected);
    }

    #[test]
    fn test_v2_layout() {
        let expected = "\
decl-version 2.0
input-language MySQL

ppt t:::POINT
ppt-type point
  variable t.id
    var-kind variable
    dec-type INT
    rep-type hashcode
    flags non_null
    comparability 2
  variable t.name__IS_NULL__
    var-kind variable
    dec-type t.name__IS_NULL__
    rep-type hashcode
    comparability 8
  variable t.name
    var-kind variable
    dec-type VARCHAR(10)
    rep-type java.lang.String
    comparability 1

";
        assert_eq!(render(&[sample_table()], DeclsVersion::V2), expected);
    }

    #[test]
    fn test_v2_marks_arrays() {
        let table = Table::from_schema(&TableSchema {
            name: "files".to_string(),
            columns: vec![
                ColumnInfo::new("data", "blob", false, false),
                ColumnInfo::new("tags", "set('a','b')", false, false),
            ],
        });
        let out = render(&[table], DeclsVersion::V2);
        assert_eq!(out.matches("    array 1\n").count(), 2);
        assert!(out.contains("    rep-type int[]\n    array 1\n    comparability 4[2]\n"));
        assert!(out.contains(
            "    rep-type java.lang.String[]\n    array 1\n    comparability 5[1]\n"
        ));
        assert!(!out.contains("flags"));
    }

    #[test]
    fn test_indicator_precedes_every_nullable_field() {
        let table = Table::from_schema(&TableSchema {
            name: "my table".to_string(),
            columns: vec![
                ColumnInfo::new("a b", "int", true, false),
                ColumnInfo::new("c", "double", true, false),
                ColumnInfo::new("d", "date", false, false),
            ],
        });
        for version in [DeclsVersion::V1, DeclsVersion::V2] {
            let out = render(std::slice::from_ref(&table), version);
            let a = out.find("my_table.a_b__IS_NULL__").unwrap();
            let a_value = out.find("my_table.a_b\n").unwrap();
            assert!(a < a_value, "{version}");
            // each indicator name appears twice: as the variable and as its dec-type
            assert_eq!(out.matches("__IS_NULL__").count(), 4, "{version}");
            assert!(!out.contains("my_table.d__IS_NULL__"));
        }
    }

    #[test]
    fn test_multiple_tables_keep_order() {
        let a = Table::from_schema(&TableSchema {
            name: "b_second".to_string(),
            columns: vec![ColumnInfo::new("x", "int", false, false)],
        });
        let b = Table::from_schema(&TableSchema {
            name: "a_first".to_string(),
            columns: vec![ColumnInfo::new("y", "int", false, false)],
        });
        let out = render(&[a, b], DeclsVersion::V2);
        let second = out.find("ppt b_second:::POINT").unwrap();
        let first = out.find("ppt a_first:::POINT").unwrap();
        assert!(second < first);
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!("1".parse::<DeclsVersion>().unwrap(), DeclsVersion::V1);
        assert_eq!("1.0".parse::<DeclsVersion>().unwrap(), DeclsVersion::V1);
        assert_eq!("2.0".parse::<DeclsVersion>().unwrap(), DeclsVersion::V2);
        assert!("3".parse::<DeclsVersion>().is_err());
        assert_eq!(DeclsVersion::default(), DeclsVersion::V2);
    }

    #[test]
    fn test_keep_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.decls");
        std::fs::write(&path, "old").unwrap();

        let tables = [sample_table()];
        assert!(!write_decls_file(&path, &tables, DeclsVersion::V2, false).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");

        assert!(write_decls_file(&path, &tables, DeclsVersion::V2, true).unwrap());
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("decl-version 2.0\n"));
    }
}
