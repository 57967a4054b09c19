use super::*;

fn article(id: &str, title: &str, body: &str) -> Article {
    Article {
        id: id.to_owned(),
        title: title.to_owned(),
        body: body.to_owned(),
        extra: BTreeMap::new(),
    }
}

fn author(id: &str) -> Author {
    Author {
        id: id.to_owned(),
        extra: BTreeMap::new(),
    }
}

#[test]
fn index_maps_each_id_to_its_article() {
    let articles = vec![article("a", "A", ""), article("b", "B", ""), article("c", "C", "")];
    let raw = RawData {
        articles: articles.clone(),
        authors: Vec::new(),
    };
    let (map, _) = raw.index().unwrap();
    assert_eq!(map.len(), articles.len());
    for a in &articles {
        assert_eq!(map.get(&a.id), Some(a));
    }
}

#[test]
fn duplicate_article_id_is_an_error() {
    let raw = RawData {
        articles: vec![article("a", "first", ""), article("a", "second", "")],
        authors: Vec::new(),
    };
    assert_eq!(
        raw.index().unwrap_err(),
        DataError::DuplicateId {
            kind: RecordKind::Article,
            id: "a".to_owned(),
        }
    );
}

#[test]
fn duplicate_author_id_is_an_error() {
    let raw = RawData {
        articles: Vec::new(),
        authors: vec![author("x"), author("x")],
    };
    assert_eq!(
        raw.index().unwrap_err(),
        DataError::DuplicateId {
            kind: RecordKind::Author,
            id: "x".to_owned(),
        }
    );
}

#[test]
fn empty_id_is_an_error() {
    let raw = RawData {
        articles: vec![article("a", "A", ""), article("", "B", "")],
        authors: Vec::new(),
    };
    assert_eq!(
        raw.index().unwrap_err(),
        DataError::MissingId {
            kind: RecordKind::Article,
            index: 1,
        }
    );
}

#[test]
fn error_display() {
    let err = DataError::DuplicateId {
        kind: RecordKind::Author,
        id: "x".to_owned(),
    };
    assert_eq!(err.to_string(), "duplicate author id `x`");
    let err = DataError::MissingId {
        kind: RecordKind::Article,
        index: 3,
    };
    assert_eq!(err.to_string(), "article at index 3 has an empty id");
}

#[test]
fn wire_payload_parses_with_extra_fields() {
    let json = r#"{
        "articles": [
            { "id": "a", "title": "Foo", "body": "bar", "authorId": "x" }
        ],
        "authors": [
            { "id": "x", "firstName": "Ada" }
        ]
    }"#;
    let raw = RawData::from_json(json).unwrap();
    assert_eq!(raw.articles[0].extra["authorId"], Value::from("x"));
    assert_eq!(raw.authors[0].extra["firstName"], Value::from("Ada"));

    let (articles, authors) = raw.index().unwrap();
    assert_eq!(articles["a"].title, "Foo");
    assert_eq!(authors["x"].id, "x");
}

#[test]
fn wire_payload_round_trips() {
    let raw = RawData {
        articles: vec![article("a", "Foo", "bar")],
        authors: vec![author("x")],
    };
    let json = raw.to_json().unwrap();
    assert_eq!(RawData::from_json(&json).unwrap(), raw);
}
