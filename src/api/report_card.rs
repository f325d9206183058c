//! Local report-card rendering, used when the backend PDF service is unavailable.

use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::contract::{GradeRecord, StudentInfo};
use crate::error::{AppError, AppResult};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const COLUMNS: [(&str, f32); 6] =
    [("Disciplina", 20.0), ("1º Bim", 80.0), ("2º Bim", 102.0), ("3º Bim", 124.0), ("4º Bim", 146.0), ("Média", 170.0)];

fn pdf_err<E: std::fmt::Debug>(e: E) -> AppError {
    AppError::Storage(format!("pdf render: {:?}", e))
}

fn cell(v: Option<f64>) -> String {
    match v {
        Some(g) => format!("{:.1}", g),
        None => "-".to_string(),
    }
}

/// Render a single report card: header with the student's details, one row per subject,
/// and the generation date in the footer.
pub fn render(student: &StudentInfo, grades: &[GradeRecord], generated_on: &str) -> AppResult<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new("Boletim Escolar", Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;
    let mut canvas = doc.get_page(page).get_layer(layer);

    canvas.use_text("Boletim Escolar", 18.0, Mm(80.0), Mm(PAGE_H - 20.0), &bold);
    canvas.use_text(format!("Aluno: {}", student.name), 12.0, Mm(20.0), Mm(PAGE_H - 40.0), &regular);
    canvas.use_text(format!("RM: {}", student.rm), 12.0, Mm(20.0), Mm(PAGE_H - 47.0), &regular);
    canvas.use_text(format!("Curso: {}", student.course), 12.0, Mm(20.0), Mm(PAGE_H - 54.0), &regular);

    let mut y = PAGE_H - 65.0;
    for (title, x) in COLUMNS {
        canvas.use_text(title, 11.0, Mm(x), Mm(y), &bold);
    }
    for g in grades {
        y -= 7.0;
        if y < 20.0 {
            let (p, l) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            canvas = doc.get_page(p).get_layer(l);
            y = PAGE_H - 20.0;
        }
        let row = [
            g.subject.clone(),
            cell(g.bimester1),
            cell(g.bimester2),
            cell(g.bimester3),
            cell(g.bimester4),
            cell(Some(g.average)),
        ];
        for ((_, x), text) in COLUMNS.iter().zip(row) {
            canvas.use_text(text, 10.0, Mm(*x), Mm(y), &regular);
        }
    }
    canvas.use_text(format!("Gerado em: {}", generated_on), 10.0, Mm(20.0), Mm(10.0), &regular);

    doc.save_to_bytes().map_err(pdf_err)
}

fn file_stem(student_id: &str) -> String {
    let safe: String = student_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("boletim-{}-{}", safe, chrono::Utc::now().timestamp_millis())
}

/// Write the rendered bytes under `dir` and return the absolute file path.
pub async fn write(dir: &Path, student_id: &str, bytes: &[u8]) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.pdf", file_stem(student_id)));
    tokio::fs::write(&path, bytes).await?;
    Ok(tokio::fs::canonicalize(&path).await?)
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
