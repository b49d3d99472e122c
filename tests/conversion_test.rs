//! Conversion engine tests over hand-built document trees.

use pretty_assertions::assert_eq;

use weft::convert::{ConversionOptions, convert_document};
use weft::diagnostics::Severity;
use weft::document::{
    Bookmark, BreakType, Comment, CommentReference, Document, DocumentElement, Hyperlink, Image,
    Note, NoteReference, NoteType, Notes, NumberingLevel, Paragraph, Run, Table, TableCell,
    TableRow, VerticalAlignment,
};
use weft::error::Error;
use weft::write::write_html;

fn options_without_defaults(style_map: &str) -> ConversionOptions {
    ConversionOptions {
        style_map: style_map.to_string(),
        include_default_style_map: false,
        ..ConversionOptions::default()
    }
}

fn convert_to_string(document: &Document, options: &ConversionOptions) -> (String, Vec<String>) {
    let (nodes, diagnostics) = convert_document(document, options);
    let messages = diagnostics
        .into_vec()
        .into_iter()
        .map(|diagnostic| diagnostic.message)
        .collect();
    (write_html(&nodes), messages)
}

fn paragraph_of(children: Vec<DocumentElement>) -> DocumentElement {
    DocumentElement::Paragraph(Paragraph {
        children,
        ..Paragraph::default()
    })
}

fn run_of(children: Vec<DocumentElement>) -> Run {
    Run {
        children,
        ..Run::default()
    }
}

fn text(value: &str) -> DocumentElement {
    DocumentElement::Text(value.to_string())
}

fn document_of(children: Vec<DocumentElement>) -> Document {
    Document {
        children,
        ..Document::default()
    }
}

#[test]
fn test_paragraph_uses_default_path() {
    let document = document_of(vec![paragraph_of(vec![text("Hello")])]);
    let (html, messages) = convert_to_string(&document, &options_without_defaults(""));

    assert_eq!(html, "<p>Hello</p>");
    assert!(messages.is_empty());
}

#[test]
fn test_style_rule_overrides_default() {
    let document = document_of(vec![paragraph_of(vec![text("Hello")])]);
    let (html, _) = convert_to_string(&document, &options_without_defaults("p => h1"));

    assert_eq!(html, "<h1>Hello</h1>");
}

#[test]
fn test_earlier_specific_rule_wins_over_later_generic_rule() {
    let document = document_of(vec![DocumentElement::Paragraph(Paragraph {
        style_id: Some("Heading1".to_string()),
        style_name: Some("heading 1".to_string()),
        children: vec![text("Title")],
        ..Paragraph::default()
    })]);

    let options =
        options_without_defaults("p[style-name='Heading 1'] => h1:fresh\np => p:fresh\n");
    let (html, messages) = convert_to_string(&document, &options);

    // Case differs from the rule; equals matching is case-insensitive.
    assert_eq!(html, "<h1>Title</h1>");
    assert!(messages.is_empty());
}

#[test]
fn test_unrecognised_paragraph_style_warns_and_falls_back() {
    let document = document_of(vec![DocumentElement::Paragraph(Paragraph {
        style_id: Some("Mystery".to_string()),
        style_name: Some("Mystery Style".to_string()),
        children: vec![text("x")],
        ..Paragraph::default()
    })]);

    let (html, messages) = convert_to_string(&document, &ConversionOptions::default());

    assert_eq!(html, "<p>x</p>");
    assert_eq!(
        messages,
        vec!["Unrecognised paragraph style: 'Mystery Style' (Style ID: Mystery)"]
    );
}

#[test]
fn test_empty_paragraphs_are_dropped_by_default() {
    let document = document_of(vec![paragraph_of(vec![])]);

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(html, "");

    let options = ConversionOptions {
        ignore_empty_paragraphs: false,
        include_default_style_map: false,
        ..ConversionOptions::default()
    };
    let (html, _) = convert_to_string(&document, &options);
    assert_eq!(html, "<p></p>");
}

#[test]
fn test_formatting_layers_nest_in_fixed_order() {
    let document = document_of(vec![paragraph_of(vec![DocumentElement::Run(Run {
        bold: true,
        italic: true,
        ..run_of(vec![text("both")])
    })])]);

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(html, "<p><strong><em>both</em></strong></p>");
}

#[test]
fn test_strikethrough_and_vertical_alignment_defaults() {
    let document = document_of(vec![paragraph_of(vec![
        DocumentElement::Run(Run {
            strikethrough: true,
            ..run_of(vec![text("gone")])
        }),
        DocumentElement::Run(Run {
            vertical_alignment: VerticalAlignment::Subscript,
            ..run_of(vec![text("2")])
        }),
    ])]);

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(html, "<p><s>gone</s><sub>2</sub></p>");
}

#[test]
fn test_underline_is_unstyled_by_default_but_mappable() {
    let underlined = document_of(vec![paragraph_of(vec![DocumentElement::Run(Run {
        underline: true,
        ..run_of(vec![text("u")])
    })])]);

    let (html, _) = convert_to_string(&underlined, &options_without_defaults(""));
    assert_eq!(html, "<p>u</p>");

    let (html, _) = convert_to_string(&underlined, &options_without_defaults("u => em"));
    assert_eq!(html, "<p><em>u</em></p>");
}

#[test]
fn test_adjacent_identically_formatted_runs_merge() {
    let document = document_of(vec![paragraph_of(vec![
        DocumentElement::Run(Run {
            bold: true,
            ..run_of(vec![text("T")])
        }),
        DocumentElement::Run(Run {
            bold: true,
            ..run_of(vec![text("HE")])
        }),
    ])]);

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(html, "<p><strong>THE</strong></p>");
}

#[test]
fn test_ignored_run_style_suppresses_content_and_side_effects() {
    let document = Document {
        children: vec![paragraph_of(vec![
            text("visible"),
            DocumentElement::Run(Run {
                style_id: Some("Secret".to_string()),
                style_name: Some("Secret".to_string()),
                ..run_of(vec![DocumentElement::NoteReference(NoteReference {
                    note_type: NoteType::Footnote,
                    note_id: "1".to_string(),
                })])
            }),
        ])],
        notes: Notes::new(vec![Note {
            note_type: NoteType::Footnote,
            id: "1".to_string(),
            body: vec![paragraph_of(vec![text("hidden note")])],
        }]),
        ..Document::default()
    };

    let options = options_without_defaults("r[style-name='Secret'] => !");
    let (html, messages) = convert_to_string(&document, &options);

    // The note reference inside the ignored run was never evaluated, so
    // no note list is emitted.
    assert_eq!(html, "<p>visible</p>");
    assert!(messages.is_empty());
}

#[test]
fn test_line_break_defaults_to_br() {
    let document = document_of(vec![paragraph_of(vec![
        text("a"),
        DocumentElement::Break(BreakType::Line),
        text("b"),
    ])]);

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(html, "<p>a<br />b</p>");
}

#[test]
fn test_page_break_is_dropped_unless_mapped() {
    let document = document_of(vec![paragraph_of(vec![DocumentElement::Break(
        BreakType::Page,
    )])]);

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(html, "");

    let (html, _) =
        convert_to_string(&document, &options_without_defaults("br[type='page'] => hr"));
    assert_eq!(html, "<p><hr /></p>");
}

#[test]
fn test_list_paragraphs_share_one_list_element() {
    let numbering = Some(NumberingLevel {
        level_index: 0,
        is_ordered: true,
    });
    let document = document_of(vec![
        DocumentElement::Paragraph(Paragraph {
            numbering,
            children: vec![text("One")],
            ..Paragraph::default()
        }),
        DocumentElement::Paragraph(Paragraph {
            numbering,
            children: vec![text("Two")],
            ..Paragraph::default()
        }),
    ]);

    let (html, _) = convert_to_string(&document, &ConversionOptions::default());
    assert_eq!(html, "<ol><li>One</li><li>Two</li></ol>");
}

#[test]
fn test_hyperlinks_render_and_adjacent_links_merge() {
    let document = document_of(vec![paragraph_of(vec![
        DocumentElement::Hyperlink(Hyperlink {
            href: Some("http://example.com".to_string()),
            children: vec![text("split ")],
            ..Hyperlink::default()
        }),
        DocumentElement::Hyperlink(Hyperlink {
            href: Some("http://example.com".to_string()),
            children: vec![text("link")],
            ..Hyperlink::default()
        }),
    ])]);

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(
        html,
        "<p><a href=\"http://example.com\">split link</a></p>"
    );
}

#[test]
fn test_anchor_hyperlink_uses_id_prefix() {
    let document = document_of(vec![paragraph_of(vec![DocumentElement::Hyperlink(
        Hyperlink {
            anchor: Some("section-2".to_string()),
            children: vec![text("jump")],
            ..Hyperlink::default()
        },
    )])]);

    let options = ConversionOptions {
        id_prefix: "doc-".to_string(),
        include_default_style_map: false,
        ..ConversionOptions::default()
    };
    let (html, _) = convert_to_string(&document, &options);
    assert_eq!(html, "<p><a href=\"#doc-section-2\">jump</a></p>");
}

#[test]
fn test_bookmark_becomes_empty_anchor() {
    let document = document_of(vec![paragraph_of(vec![
        DocumentElement::Bookmark(Bookmark {
            name: "here".to_string(),
        }),
        text("content"),
    ])]);

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(html, "<p><a id=\"here\"></a>content</p>");
}

#[test]
fn test_note_references_number_sequentially_and_notes_render_after_body() {
    let document = Document {
        children: vec![paragraph_of(vec![
            text("a"),
            DocumentElement::NoteReference(NoteReference {
                note_type: NoteType::Footnote,
                note_id: "1".to_string(),
            }),
        ])],
        notes: Notes::new(vec![Note {
            note_type: NoteType::Footnote,
            id: "1".to_string(),
            body: vec![paragraph_of(vec![text("Note text")])],
        }]),
        ..Document::default()
    };

    let (html, messages) = convert_to_string(&document, &options_without_defaults(""));

    assert_eq!(
        html,
        concat!(
            "<p>a<sup><a href=\"#footnote-1\" id=\"footnote-ref-1\">[1]</a></sup></p>",
            "<ol><li id=\"footnote-1\"><p>Note text <a href=\"#footnote-ref-1\">↑</a></p></li></ol>"
        )
    );
    assert!(messages.is_empty());
}

#[test]
fn test_footnotes_and_endnotes_share_one_number_sequence() {
    let document = Document {
        children: vec![paragraph_of(vec![
            DocumentElement::NoteReference(NoteReference {
                note_type: NoteType::Footnote,
                note_id: "1".to_string(),
            }),
            DocumentElement::NoteReference(NoteReference {
                note_type: NoteType::Endnote,
                note_id: "1".to_string(),
            }),
        ])],
        notes: Notes::new(vec![
            Note {
                note_type: NoteType::Footnote,
                id: "1".to_string(),
                body: vec![paragraph_of(vec![text("foot")])],
            },
            Note {
                note_type: NoteType::Endnote,
                id: "1".to_string(),
                body: vec![paragraph_of(vec![text("end")])],
            },
        ]),
        ..Document::default()
    };

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));

    assert!(html.contains(">[1]<"));
    assert!(html.contains(">[2]<"));
    assert!(html.contains("id=\"footnote-1\""));
    assert!(html.contains("id=\"endnote-1\""));
}

#[test]
fn test_comment_references_are_ignored_by_default() {
    let document = Document {
        children: vec![paragraph_of(vec![
            text("x"),
            DocumentElement::CommentReference(CommentReference {
                comment_id: "7".to_string(),
            }),
        ])],
        comments: vec![Comment {
            comment_id: "7".to_string(),
            author_name: Some("Tabitha Wick".to_string()),
            author_initials: Some("TW".to_string()),
            body: vec![paragraph_of(vec![text("Comment body")])],
        }],
        ..Document::default()
    };

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(html, "<p>x</p>");
}

#[test]
fn test_mapped_comment_references_render_with_labels_and_list() {
    let document = Document {
        children: vec![paragraph_of(vec![
            text("x"),
            DocumentElement::CommentReference(CommentReference {
                comment_id: "7".to_string(),
            }),
        ])],
        comments: vec![Comment {
            comment_id: "7".to_string(),
            author_name: Some("Tabitha Wick".to_string()),
            author_initials: Some("TW".to_string()),
            body: vec![paragraph_of(vec![text("Comment body")])],
        }],
        ..Document::default()
    };

    let options = options_without_defaults("comment-reference => sup");
    let (html, _) = convert_to_string(&document, &options);

    assert_eq!(
        html,
        concat!(
            "<p>x<sup><a href=\"#comment-7\" id=\"comment-ref-7\">[TW1]</a></sup></p>",
            "<dl><dt id=\"comment-7\">Comment [TW1]</dt>",
            "<dd><p>Comment body <a href=\"#comment-ref-7\">↑</a></p></dd></dl>"
        )
    );
}

#[test]
fn test_images_resolve_in_order_to_data_uris() {
    let document = document_of(vec![paragraph_of(vec![DocumentElement::Image(
        Image::new(
            Some("a pixel".to_string()),
            Some("image/png".to_string()),
            || Ok(vec![1, 2, 3]),
        ),
    )])]);

    let (html, messages) = convert_to_string(&document, &options_without_defaults(""));

    assert_eq!(
        html,
        "<p><img alt=\"a pixel\" src=\"data:image/png;base64,AQID\" /></p>"
    );
    assert!(messages.is_empty());
}

#[test]
fn test_failed_image_becomes_error_diagnostic_and_empty_content() {
    let document = document_of(vec![paragraph_of(vec![
        text("before"),
        DocumentElement::Image(Image::new(None, Some("image/png".to_string()), || {
            Err(Error::Image("media/image1.png: file not found".to_string()))
        })),
        DocumentElement::Image(Image::new(None, Some("image/png".to_string()), || {
            Ok(vec![4])
        })),
    ])]);

    let (nodes, diagnostics) = convert_document(&document, &options_without_defaults(""));
    let html = write_html(&nodes);

    // The failure is contained; the later image still resolves.
    assert_eq!(
        html,
        "<p>before<img src=\"data:image/png;base64,BA==\" /></p>"
    );
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("file not found"));
}

#[test]
fn test_unsupported_image_type_warns() {
    let document = document_of(vec![paragraph_of(vec![DocumentElement::Image(
        Image::new(None, Some("image/x-emf".to_string()), || Ok(vec![0])),
    )])]);

    let (_, messages) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(
        messages,
        vec!["Image of type image/x-emf is unlikely to display in web browsers"]
    );
}

#[test]
fn test_table_renders_header_and_spans() {
    let header_cell = TableCell {
        children: vec![paragraph_of(vec![text("H")])],
        ..TableCell::default()
    };
    let wide_cell = TableCell {
        colspan: 2,
        children: vec![paragraph_of(vec![text("wide")])],
        ..TableCell::default()
    };
    let tall_cell = TableCell {
        rowspan: 2,
        children: vec![paragraph_of(vec![text("tall")])],
        ..TableCell::default()
    };

    let document = document_of(vec![DocumentElement::Table(Table {
        children: vec![
            DocumentElement::TableRow(TableRow {
                is_header: true,
                children: vec![DocumentElement::TableCell(header_cell)],
            }),
            DocumentElement::TableRow(TableRow {
                is_header: false,
                children: vec![
                    DocumentElement::TableCell(wide_cell),
                    DocumentElement::TableCell(tall_cell),
                ],
            }),
        ],
        ..Table::default()
    })]);

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));

    assert_eq!(
        html,
        concat!(
            "<table>",
            "<thead><tr><th><p>H</p></th></tr></thead>",
            "<tbody><tr><td colspan=\"2\"><p>wide</p></td>",
            "<td rowspan=\"2\"><p>tall</p></td></tr></tbody>",
            "</table>"
        )
    );
}

#[test]
fn test_empty_table_cells_are_preserved() {
    let document = document_of(vec![DocumentElement::Table(Table {
        children: vec![DocumentElement::TableRow(TableRow {
            is_header: false,
            children: vec![DocumentElement::TableCell(TableCell::default())],
        })],
        ..Table::default()
    })]);

    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(html, "<table><tr><td></td></tr></table>");
}

#[test]
fn test_invalid_style_map_rule_is_reported_not_fatal() {
    let document = document_of(vec![paragraph_of(vec![text("ok")])]);
    let options = options_without_defaults("p =>> h1");

    let (html, messages) = convert_to_string(&document, &options);

    assert_eq!(html, "<p>ok</p>");
    assert_eq!(messages.len(), 1);
    assert!(
        messages[0].starts_with("Did not understand this style mapping, so ignored it: p =>> h1")
    );
}

#[test]
fn test_tab_becomes_tab_character() {
    let document = document_of(vec![paragraph_of(vec![text("a"), DocumentElement::Tab])]);
    let (html, _) = convert_to_string(&document, &options_without_defaults(""));
    assert_eq!(html, "<p>a\t</p>");
}
