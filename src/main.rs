use clap::{Parser, Subcommand};
use royalbit_sheetmap::cli::{self, ImportArgs};
use royalbit_sheetmap::SheetResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetmap")]
#[command(about = "Typed records to Excel workbooks and back, driven by YAML schemas.")]
#[command(long_about = "Sheetmap - Schema-driven Excel export and import

A schema declares, per record field, the column header, display order,
preferred width, value type and a date or number pattern. Export writes
one worksheet with a styled header row; import reads .xls or .xlsx files
and maps each data row back into a record by header text.

COMMANDS:
  export   - JSON records to Excel (.xlsx)
  import   - Excel (.xls/.xlsx) to JSON records
  inspect  - Show the column plan of a schema

EXAMPLES:
  sheetmap export employee.yaml staff.json staff.xlsx
  sheetmap import employee.yaml staff.xlsx --header-band 0 --ignore-start 0
  sheetmap inspect employee.yaml")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Export a JSON array of records to an .xlsx workbook.

The workbook holds a single sheet named 'sheet1': a header row with a thin
border and a light turquoise fill, then one row per record. Columns follow
the schema's field order; widths grow with the longest text value.

By default only the schema's own fields are written. Use
--include-inherited to also write fields pulled in through 'extends'.

EXAMPLE:
  sheetmap export employee.yaml staff.json staff.xlsx")]
    /// Export JSON records to Excel .xlsx
    Export {
        /// Path to the YAML schema
        schema: PathBuf,

        /// Path to a JSON array of record objects
        records: PathBuf,

        /// Output Excel file path (.xlsx)
        output: PathBuf,

        /// Also write fields inherited from base schemas
        #[arg(long)]
        include_inherited: bool,

        /// Show verbose export steps
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Import an .xls or .xlsx workbook into JSON records.

Every worksheet is read. The first rows of each sheet (the header band,
2 by default) are skipped, the remaining rows are concatenated, and the
header row is matched against the schema's column headers.

Row numbers are 1-based and counted after the header band. For a workbook
written by 'sheetmap export' use --header-band 0 --ignore-start 0.

The first cell that cannot be converted aborts the import with its row
number and column header.

EXAMPLE:
  sheetmap import employee.yaml staff.xlsx -o staff.json")]
    /// Import Excel .xls/.xlsx to JSON records
    Import {
        /// Path to the YAML schema
        schema: PathBuf,

        /// Path to Excel file (.xls or .xlsx)
        input: PathBuf,

        /// Output JSON file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rows in front of the grid, added to reported row numbers (default: 2)
        #[arg(long)]
        ignore_start: Option<usize>,

        /// 1-based header row within the grid (default: 1)
        #[arg(long)]
        header_row: Option<usize>,

        /// 1-based first data row within the grid (default: 2)
        #[arg(long)]
        data_start: Option<usize>,

        /// Trailing rows to leave out (default: 0)
        #[arg(long)]
        ignore_end: Option<usize>,

        /// Leading rows of each sheet to drop (default: 2)
        #[arg(long)]
        header_band: Option<usize>,

        /// Show verbose import steps
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the column plan of a schema
    Inspect {
        /// Path to the YAML schema
        schema: PathBuf,
    },
}

fn main() -> SheetResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            schema,
            records,
            output,
            include_inherited,
            verbose,
        } => cli::export(schema, records, output, include_inherited, verbose),

        Commands::Import {
            schema,
            input,
            output,
            ignore_start,
            header_row,
            data_start,
            ignore_end,
            header_band,
            verbose,
        } => cli::import(
            schema,
            input,
            output,
            ImportArgs {
                ignore_start,
                header_row,
                data_start,
                ignore_end,
                header_band,
            },
            verbose,
        ),

        Commands::Inspect { schema } => cli::inspect(schema),
    }
}
