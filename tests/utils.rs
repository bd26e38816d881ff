use lopdf_graph::{Dictionary, Document, ObjectId, PdfName, Result};

#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds `1 0 obj` (Pages, with /Rotate and /MediaBox) and `2 0 obj` (a Page
/// whose /Parent is `1 0 R`). Returns the page.
#[allow(dead_code)]
pub fn page_tree(doc: &Document) -> Result<(Dictionary, ObjectId)> {
    let pages = doc.new_dictionary()?;
    pages.set(PdfName::Type, PdfName::Pages)?;
    pages.set(PdfName::Rotate, 90)?;
    let media_box = doc.new_array()?;
    for value in [0, 0, 612, 792] {
        media_box.push(value)?;
    }
    pages.set(PdfName::MediaBox, media_box)?;
    let pages_id = doc.add_object(&pages)?;

    let page = doc.new_dictionary()?;
    page.set(PdfName::Type, PdfName::Page)?;
    page.set(PdfName::Parent, pages_id)?;
    let page_id = doc.add_object(&page)?;
    pages.set(PdfName::Kids, doc.new_array()?)?;
    pages
        .get(PdfName::Kids)?
        .ok_or(lopdf_graph::Error::UsageViolation("missing /Kids"))?
        .as_array()?
        .push(page_id)?;
    pages.set(PdfName::Count, 1)?;
    Ok((page, page_id))
}
