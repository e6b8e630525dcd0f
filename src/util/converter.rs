use anyhow::{anyhow, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Instant;
use tokio::task;

const DOCUMENT_PART: &str = "word/document.xml";

/// 解压后正文部件的上限，防止压缩炸弹
const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

/// 文件名是否以 `.docx` 结尾（不区分大小写）
pub fn has_docx_extension(file_name: &str) -> bool {
    Path::new(file_name.trim())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("docx"))
        .unwrap_or(false)
}

/// 从 DOCX 字节中提取正文纯文本，在阻塞线程池中执行
pub async fn docx_to_text(docx: Vec<u8>) -> Result<String> {
    let start = Instant::now();
    let size = docx.len();
    let text = task::spawn_blocking(move || extract_docx_text(&docx))
        .await
        .map_err(|e| anyhow!("DOCX文本提取任务异常: {}", e))??;

    tracing::debug!(
        event = "docx.extracted",
        bytes = size,
        text_chars = text.chars().count(),
        duration_ms = start.elapsed().as_millis() as u64
    );
    Ok(text)
}

/// 同步提取：逐段拼接 `w:t` 文本，段落之间以 `\n` 连接；没有段落时返回空字符串
pub fn extract_docx_text(docx: &[u8]) -> Result<String> {
    let xml = read_document_part(docx)?;
    paragraphs_from_xml(&xml).map(|paragraphs| paragraphs.join("\n"))
}

fn read_document_part(docx: &[u8]) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(docx)).context("不是有效的DOCX文件(zip容器无法打开)")?;
    let entry = archive
        .by_name(DOCUMENT_PART)
        .with_context(|| format!("DOCX缺少正文部件 {}", DOCUMENT_PART))?;

    let mut xml = String::new();
    entry
        .take(MAX_DOCUMENT_XML_BYTES)
        .read_to_string(&mut xml)
        .context("读取DOCX正文失败")?;
    Ok(xml)
}

/// 嵌套段落（文本框等）各自成段，外层段落只保留自身文本
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader
            .read_event()
            .with_context(|| format!("DOCX正文XML解析失败(位置 {})", reader.buffer_position()))?
        {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text_run = true,
                b"tab" => push_str(&mut open, "\t"),
                b"br" | b"cr" => push_str(&mut open, "\n"),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" => push_str(&mut open, "\t"),
                b"br" | b"cr" => push_str(&mut open, "\n"),
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                b"t" => in_text_run = false,
                _ => {}
            },
            Event::Text(t) if in_text_run => {
                let text = t.unescape().context("DOCX文本实体解码失败")?;
                push_str(&mut open, &text);
            }
            Event::CData(c) if in_text_run => {
                push_str(&mut open, &String::from_utf8_lossy(&c));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_str(open: &mut [String], s: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(s);
    }
}
