use dinox_core::Note;

pub const DEFAULT_TEMPLATE: &str = "---
title: {{title}}
note id: {{noteId}}
type: {{type}}
tags:
{{#tags}}
    - #{{.}}#
{{/tags}}
link:
audio: [download]({{audioUrl}})
created: {{createTime}}
updated: {{updateTime}}
---

{{content}}
";

const TAGS_OPEN: &str = "{{#tags}}";
const TAGS_CLOSE: &str = "{{/tags}}";

/// Expands a mustache-style template for one note.
///
/// Scalars render verbatim (unknown names render empty). The single
/// `{{#tags}}...{{/tags}}` block repeats once per tag with `{{.}}` bound to
/// the tag; a block tag alone on its line takes the whole line with it.
pub fn render(template: &str, note: &Note) -> String {
    let Some(open) = template.find(TAGS_OPEN) else {
        return substitute(template, note, None);
    };
    let after_open = open + TAGS_OPEN.len();
    let Some(close) = template[after_open..]
        .find(TAGS_CLOSE)
        .map(|offset| after_open + offset)
    else {
        return substitute(template, note, None);
    };
    let after_close = close + TAGS_CLOSE.len();

    let (head_end, body_start) = standalone_span(template, open, after_open);
    let (body_end, tail_start) = standalone_span(template, close, after_close);
    let body = &template[body_start..body_end];

    let mut out = substitute(&template[..head_end], note, None);
    for tag in &note.tags {
        out.push_str(&substitute(body, note, Some(tag.as_str())));
    }
    out.push_str(&substitute(&template[tail_start..], note, None));
    out
}

fn standalone_span(template: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = template[..start].rfind('\n').map_or(0, |idx| idx + 1);
    let line_end = template[end..]
        .find('\n')
        .map_or(template.len(), |idx| end + idx + 1);
    let alone = template[line_start..start].trim().is_empty()
        && template[end..line_end].trim().is_empty();
    if alone {
        (line_start, line_end)
    } else {
        (start, end)
    }
}

fn substitute(text: &str, note: &Note, current: Option<&str>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        out.push_str(field(note, after[..end].trim(), current));
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn field<'a>(note: &'a Note, name: &str, current: Option<&'a str>) -> &'a str {
    match name {
        "title" => &note.title,
        "noteId" => &note.note_id,
        "type" => &note.note_type,
        "createTime" => &note.create_time,
        "updateTime" => &note.update_time,
        "audioUrl" => &note.audio_url,
        "content" => &note.content,
        "." => current.unwrap_or_default(),
        _ => "",
    }
}
