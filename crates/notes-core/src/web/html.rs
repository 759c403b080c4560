//! Server-rendered page for the web front end.

use crate::note::Note;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Notes App</title>
  <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-100">
  <div class="container mx-auto p-4">
    <div class="flex justify-between items-center mb-4">
      <h1 class="text-2xl font-bold">Notes</h1>
      <button id="createBtn" class="px-4 py-2 bg-blue-500 text-white rounded">Create Note</button>
    </div>
    <div id="notesList">
"#;

const PAGE_TAIL: &str = r#"    </div>
  </div>

  <dialog id="modal" class="p-4 rounded bg-white w-1/2">
    <form method="POST" action="/notes" class="flex flex-col space-y-4">
      <h2 id="modalTitle" class="text-xl font-semibold">Create Note</h2>
      <input type="text" name="id" id="id" placeholder="Id" required class="border p-2 rounded">
      <input type="text" name="title" id="title" placeholder="Title" required class="border p-2 rounded">
      <input type="text" name="summary" id="summary" placeholder="Summary" required class="border p-2 rounded">
      <input type="text" name="tags" id="tags" placeholder="Tags (comma separated)" class="border p-2 rounded">
      <textarea name="content" id="content" rows="25" placeholder="Content" required class="border p-2 rounded"></textarea>
      <div class="flex justify-end space-x-2">
        <button type="submit" class="px-4 py-2 bg-green-500 text-white rounded">Save</button>
        <button type="button" id="cancelBtn" class="px-4 py-2 bg-gray-300 rounded">Cancel</button>
      </div>
    </form>
  </dialog>

  <script>
    const modal = document.getElementById('modal');
    const modalTitle = document.getElementById('modalTitle');
    const fields = ['id', 'title', 'summary', 'tags', 'content'];

    function fill(note) {
      for (const f of fields) {
        const value = note ? note[f] : '';
        document.getElementById(f).value = Array.isArray(value) ? value.join(',') : value;
      }
    }

    document.getElementById('createBtn').addEventListener('click', () => {
      modalTitle.textContent = 'Create Note';
      fill(null);
      modal.showModal();
    });

    document.getElementById('cancelBtn').addEventListener('click', () => modal.close());

    document.querySelectorAll('[data-edit]').forEach((btn) => {
      btn.addEventListener('click', () => {
        modalTitle.textContent = 'Edit Note';
        fill(JSON.parse(btn.dataset.edit));
        modal.showModal();
      });
    });

    document.querySelectorAll('[data-delete]').forEach((btn) => {
      btn.addEventListener('click', () => {
        if (confirm('Are you sure you want to delete this note?')) {
          fetch('/notes/' + encodeURIComponent(btn.dataset.delete), { method: 'DELETE' })
            .then(() => location.reload());
        }
      });
    });
  </script>
</body>
</html>
"#;

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_note(note: &Note) -> String {
    let payload = serde_json::to_string(note).unwrap_or_default();
    format!(
        r#"      <div class="bg-white p-4 rounded shadow mb-2">
        <h2 class="text-xl font-semibold">{title}</h2>
        <p class="text-gray-600">{summary}</p>
        <div class="mt-2">
          <button data-edit="{payload}" class="px-3 py-1 bg-yellow-500 text-white rounded mr-2">Edit</button>
          <button data-delete="{id}" class="px-3 py-1 bg-red-500 text-white rounded">Delete</button>
        </div>
      </div>
"#,
        title = escape_html(&note.title),
        summary = escape_html(&note.summary),
        payload = escape_html(&payload),
        id = escape_html(&note.id),
    )
}

/// Full listing page with every note.
pub fn render_home_page(notes: &[Note]) -> String {
    let mut page = String::from(PAGE_HEAD);
    for note in notes {
        page.push_str(&render_note(note));
    }
    page.push_str(PAGE_TAIL);
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"'"), "a&lt;b&gt;&amp;&quot;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_render_escapes_note_fields() {
        let note = Note {
            id: "x'1".to_string(),
            title: "<script>alert(1)</script>".to_string(),
            summary: "S & S".to_string(),
            tags: vec![],
            content: "C".to_string(),
        };
        let page = render_home_page(&[note]);
        assert!(!page.contains("<script>alert(1)"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(page.contains("S &amp; S"));
        assert!(page.contains(r#"data-delete="x&#39;1""#));
    }

    #[test]
    fn test_render_empty() {
        let page = render_home_page(&[]);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("Create Note"));
    }
}
