use crate::model::Image;
use crate::parser::dom::Document;

use super::SPONSOR_IMG_CLASS;

/// Every image on the page except sponsor banners, in page order.
pub fn extract(doc: &Document) -> Vec<Image> {
    doc.find_all("img")
        .filter(|img| !img.has_class(SPONSOR_IMG_CLASS))
        .map(|img| Image {
            file: img.attr("src").unwrap_or_default().to_string(),
            subtitle: String::new(),
        })
        .collect()
}
