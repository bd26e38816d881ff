use lopdf_graph::{Document, Error, PdfName, PdfObject, StringFormat, Value};

mod utils;

fn sample(index: usize) -> Value<'static> {
    match index {
        0 => Value::from(4),
        1 => Value::from(0.25),
        2 => Value::from(false),
        3 => Value::name("Custom"),
        4 => Value::from("Hello"),
        5 => Value::string_hex(vec![0, 1, 2]),
        _ => Value::from((3, 0)),
    }
}

#[test]
fn set_get_remove() {
    let doc = Document::new();
    let dict = doc.new_dictionary().unwrap();
    for (index, key) in ["Int", "Real", "Flag", "Name", "Text", "Raw", "Ref"].into_iter().enumerate() {
        let expected = doc.new_object(sample(index)).unwrap();
        dict.set(key, sample(index)).unwrap();
        assert_eq!(dict.get(key).unwrap().unwrap(), expected, "{}", key);
        assert!(dict.remove(key).unwrap());
        assert!(dict.get(key).unwrap().is_none());
        assert!(!dict.remove(key).unwrap());
    }
    assert!(dict.is_empty().unwrap());
}

#[test]
fn replacing_a_key_keeps_its_position() {
    let doc = Document::new();
    let dict = doc.new_dictionary().unwrap();
    dict.set("A", 1).unwrap();
    dict.set("B", 2).unwrap();
    dict.set("A", 3).unwrap();
    assert_eq!(dict.keys().unwrap(), vec![b"A".to_vec(), b"B".to_vec()]);
    assert_eq!(dict.value_at(0).unwrap().as_i64().unwrap(), 3);
    assert_eq!(dict.key_at(1).unwrap(), b"B");
    assert!(matches!(dict.key_at(2), Err(Error::IndexOutOfRange { index: 2, len: 2 })));
}

#[test]
fn insertion_order_until_sorted() {
    let doc = Document::new();
    let dict = doc.new_dictionary().unwrap();
    dict.set(PdfName::Type, PdfName::Page).unwrap();
    dict.set(PdfName::Length, 10).unwrap();
    assert_eq!(dict.len().unwrap(), 2);
    let order: Vec<Vec<u8>> = dict.iter().unwrap().map(|(key, _)| key).collect();
    assert_eq!(order, vec![b"Type".to_vec(), b"Length".to_vec()]);

    assert!(!dict.is_sorted());
    dict.sort().unwrap();
    assert!(dict.is_sorted());
    assert_eq!(dict.key_at(0).unwrap(), b"Length");
    let order: Vec<Vec<u8>> = dict.iter().unwrap().map(|(key, _)| key).collect();
    assert_eq!(order, vec![b"Length".to_vec(), b"Type".to_vec()]);

    dict.set("Annots", Value::Null).unwrap();
    assert!(!dict.is_sorted());
}

#[test]
fn abbreviated_keys() {
    let doc = Document::new();
    let image = doc.new_dictionary().unwrap();
    image.set("W", 16).unwrap();
    image.set("L", 4).unwrap();
    assert_eq!(image.get_abbrev(PdfName::Width, "W").unwrap().unwrap().as_i64().unwrap(), 16);
    image.set(PdfName::Length, 8).unwrap();
    assert_eq!(image.get_abbrev(PdfName::Length, "L").unwrap().unwrap().as_i64().unwrap(), 8);
    assert!(image.get_abbrev("Height", "H").unwrap().is_none());
}

#[test]
fn type_helpers() {
    let doc = Document::new();
    let (page, _) = utils::page_tree(&doc).unwrap();
    assert_eq!(page.type_name().unwrap().as_deref(), Some("Page"));
    assert!(page.type_is(b"Page"));
    assert!(page.type_is(PdfName::Page));
    assert!(page.type_is("Page"));
    assert!(!page.type_is(PdfName::Pages));
    let untyped = doc.new_dictionary().unwrap();
    assert_eq!(untyped.type_name().unwrap(), None);
}

#[test]
fn text_values_become_text_strings() {
    let doc = Document::new();
    let info = doc.new_dictionary().unwrap();
    info.set(PdfName::Title, "Report").unwrap();
    info.set("Subject", "Überblick \u{2013} 日本").unwrap();

    let title = info.get(PdfName::Title).unwrap().unwrap();
    assert_eq!(title.as_text().unwrap(), "Report");
    assert_eq!(title.as_string_bytes().unwrap(), b"Report");
    assert_eq!(title.string_format().unwrap(), StringFormat::Literal);

    let subject = info.get("Subject").unwrap().unwrap();
    assert_eq!(subject.as_text().unwrap(), "Überblick \u{2013} 日本");
    assert_eq!(subject.string_format().unwrap(), StringFormat::Hexadecimal);
    assert_eq!(&subject.as_string_bytes().unwrap()[..4], &[0xFE, 0xFF, 0x00, 0xDC]);
}

#[test]
fn deep_clone_is_independent() {
    let doc = Document::new();
    let array = doc.new_array().unwrap();
    array.push(1).unwrap();
    let nested = doc.new_dictionary().unwrap();
    nested.set("Key", "value").unwrap();
    array.push(&nested).unwrap();
    array.push((9, 0)).unwrap();

    let copy = array.deep_clone().unwrap();
    assert_eq!(copy, array);
    assert!(!copy.is_dirty());

    copy.push(2).unwrap();
    copy.get(1).unwrap().as_dict().unwrap().set("Key", "changed").unwrap();
    assert_eq!(array.len().unwrap(), 3);
    assert_eq!(nested.get("Key").unwrap().unwrap().as_text().unwrap(), "value");
    assert_ne!(copy, array);

    array.set(0, 100).unwrap();
    assert_eq!(copy.get(0).unwrap().as_i64().unwrap(), 1);
    // References are copied as references.
    assert_eq!(copy.get(2).unwrap().as_reference().unwrap(), (9, 0));
}

#[test]
fn array_search_is_structural() {
    let doc = Document::new();
    let array = doc.new_array().unwrap();
    array.push("a").unwrap();
    array.push(PdfName::Page).unwrap();
    array.insert(0, 5).unwrap();
    assert!(array.contains(&doc.new_text("a").unwrap()).unwrap());
    assert_eq!(array.index_of(&PdfObject::name(PdfName::Page)).unwrap(), Some(2));
    assert_eq!(array.index_of(&doc.new_object(6).unwrap()).unwrap(), None);
    assert!(matches!(array.get(3), Err(Error::IndexOutOfRange { index: 3, len: 3 })));
    assert!(matches!(array.insert(9, 1), Err(Error::IndexOutOfRange { .. })));
}

#[test]
fn mutation_during_iteration_is_reported() {
    let doc = Document::new();
    let array = doc.new_array().unwrap();
    array.push(1).unwrap();
    array.push(2).unwrap();
    let mut items = array.iter().unwrap();
    assert_eq!(items.next().unwrap().as_i64().unwrap(), 1);
    assert!(matches!(array.push(3), Err(Error::UsageViolation(_))));
    assert!(matches!(array.remove(0), Err(Error::UsageViolation(_))));
    assert_eq!(items.next().unwrap().as_i64().unwrap(), 2);
    assert!(items.next().is_none());
    drop(items);
    array.push(3).unwrap();

    let dict = doc.new_dictionary().unwrap();
    dict.set("A", 1).unwrap();
    let entries = dict.iter().unwrap();
    assert!(matches!(dict.set("B", 2), Err(Error::UsageViolation(_))));
    assert!(matches!(dict.sort(), Err(Error::UsageViolation(_))));
    assert_eq!(entries.count(), 1);
    dict.set("B", 2).unwrap();
}

#[test]
fn iterators_dropped_under_a_store_borrow_unlock() {
    utils::init_logger();
    let doc = Document::new();
    let array = doc.new_array().unwrap();
    array.push(1).unwrap();
    let dict = doc.new_dictionary().unwrap();
    dict.set("A", 1).unwrap();

    let items = array.iter().unwrap();
    let entries = dict.iter().unwrap();
    let guard = doc.store();
    drop(items);
    drop(entries);
    drop(guard);

    array.push(2).unwrap();
    dict.set("B", 2).unwrap();
    assert_eq!(array.ref_count(), Some(1));
    assert_eq!(dict.ref_count(), Some(1));
}

#[test]
fn iterator_outliving_its_array_stops() {
    utils::init_logger();
    let doc = Document::new();
    let array = doc.new_array().unwrap();
    array.push(1).unwrap();
    let mut items = array.iter().unwrap();
    drop(array);
    assert!(items.next().is_none());
    assert_eq!(doc.live_objects().unwrap(), 0);
}

#[test]
fn containers_cannot_contain_themselves() {
    let doc = Document::new();
    let array = doc.new_array().unwrap();
    assert!(matches!(array.push(&array), Err(Error::UsageViolation(_))));

    let outer = doc.new_dictionary().unwrap();
    let inner = doc.new_dictionary().unwrap();
    outer.set("Inner", &inner).unwrap();
    assert!(matches!(inner.set("Outer", &outer), Err(Error::UsageViolation(_))));
    assert_eq!(outer.ref_count(), Some(1));

    // Cycles through indirect references are fine.
    let outer_id = doc.add_object(&outer).unwrap();
    inner.set("Outer", outer_id).unwrap();
    assert_eq!(inner.get_deref("Outer").unwrap().unwrap(), *outer.object());
}
