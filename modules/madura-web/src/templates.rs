use url::form_urlencoded;

use crate::views::{
    Listing, LoteCard, LoteFormView, MaduradorCard, MaduradorFormView, PageContext,
};

const NO_RECORDS: &str = r#"<p class="empty">No records available</p>"#;

/// Render the list view: both collections with their search boxes.
pub fn render_index(
    ctx: &PageContext,
    maduradores: &Listing<MaduradorCard>,
    lotes: &Listing<LoteCard>,
    qm: &str,
    ql: &str,
) -> String {
    let mad_section = match maduradores {
        Listing::Failed(message) => load_error("fermenters", message),
        Listing::Loaded { cards, total } => {
            let mut html = count_line(cards.len(), *total, qm);
            if cards.is_empty() {
                html.push_str(NO_RECORDS);
            }
            for card in cards {
                html.push_str(&madurador_card_html(card));
            }
            html
        }
    };

    let lote_section = match lotes {
        Listing::Failed(message) => load_error("batches", message),
        Listing::Loaded { cards, total } => {
            let mut html = count_line(cards.len(), *total, ql);
            if cards.is_empty() {
                html.push_str(NO_RECORDS);
            }
            for card in cards {
                html.push_str(&lote_card_html(card));
            }
            html
        }
    };

    let content = format!(
        r#"<div class="container">
<section id="list">
  <div class="section-head">
    <h2>Fermenters</h2>
    <a class="action-btn" href="/maduradores/new">Add fermenter</a>
  </div>
  <form class="search" method="get" action="/">
    <input type="search" name="qm" value="{qm}" placeholder="Search fermenters (e.g. &quot;mad 3&quot; or &quot;#3&quot;)">
    <input type="hidden" name="ql" value="{ql}">
    <button type="submit">Search</button>
  </form>
  <div id="maduradores">{mad_section}</div>

  <div class="section-head">
    <h2>Batches</h2>
    <a class="action-btn" href="/lotes/new">Add batch</a>
  </div>
  <form class="search" method="get" action="/">
    <input type="search" name="ql" value="{ql}" placeholder="Search batches">
    <input type="hidden" name="qm" value="{qm}">
    <button type="submit">Search</button>
  </form>
  <div id="lotes">{lote_section}</div>
  <p class="meta-row"><a href="/">Refresh</a></p>
</section>
</div>"#,
        qm = html_escape(qm),
        ql = html_escape(ql),
    );

    build_page(ctx, "Fermenters", &content)
}

fn count_line(shown: usize, total: usize, query: &str) -> String {
    if query.trim().is_empty() {
        String::new()
    } else {
        format!(r#"<p class="meta-row">{shown} of {total} shown</p>"#)
    }
}

fn load_error(what: &str, message: &str) -> String {
    format!(
        r#"<div class="error-block">Error loading {what}: {}</div>"#,
        html_escape(message)
    )
}

fn card_title(kind: &str, position: Option<usize>) -> String {
    match position {
        Some(n) => format!("{kind} #{n}"),
        None => kind.to_string(),
    }
}

fn field(label: &str, value: &str) -> String {
    format!(
        r#"<div class="field"><span class="label">{}:</span><span class="value">{}</span></div>"#,
        html_escape(label),
        html_escape(value)
    )
}

fn delete_button(path: &str, id: &str) -> String {
    format!(
        concat!(
            r#"<form class="inline" method="post" action="{path}/{segment}/delete" "#,
            r#"onsubmit="return confirm('Confirm deletion');">"#,
            r#"<button type="submit" class="secondary" data-id="{id}">Delete</button></form>"#,
        ),
        path = path,
        segment = path_segment(id),
        id = html_escape(id),
    )
}

/// Percent-encode a record id for use as one URL path segment.
fn path_segment(id: &str) -> String {
    // byte_serialize writes spaces as `+`, which a path keeps literally.
    form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn madurador_card_html(card: &MaduradorCard) -> String {
    let id = html_escape(&card.id);
    let segment = path_segment(&card.id);
    format!(
        r#"<div class="record-card" data-id="{id}">
  <div class="card-header">{title}</div>
  <div class="record-grid">{litros}{estado}{notas}{lote}</div>
  <div class="card-actions"><a href="/maduradores/{segment}" data-id="{id}">View</a> <a href="/maduradores/{segment}/edit" data-id="{id}">Edit</a> {delete}</div>
</div>"#,
        title = card_title("Fermenter", card.position),
        litros = field("Litres", &card.litros),
        estado = field("Status", &card.estado),
        notas = field("Notes", &card.notas),
        lote = field("Batch", &card.lote_label),
        delete = delete_button("/maduradores", &card.id),
    )
}

fn lote_card_html(card: &LoteCard) -> String {
    let id = html_escape(&card.id);
    let segment = path_segment(&card.id);
    let name = if card.cerveza.is_empty() {
        String::new()
    } else {
        format!(" - {}", html_escape(&card.cerveza))
    };
    format!(
        r#"<div class="record-card" data-id="{id}">
  <div class="card-header">{title}{name}</div>
  <div class="record-grid">{estado}{cantidad}{carga}{vence}{notas}</div>
  <div class="card-actions"><a href="/lotes/{segment}" data-id="{id}">View</a> <a href="/lotes/{segment}/edit" data-id="{id}">Edit</a> {delete}</div>
</div>"#,
        title = card_title("Batch", card.position),
        estado = field("Status", &card.estado),
        cantidad = field("Litres", &card.cantidad_litros),
        carga = field("Load date", &card.fecha_carga),
        vence = field("Expiry date", &card.fecha_vencimiento),
        notas = field("Notes", &card.notas),
        delete = delete_button("/lotes", &card.id),
    )
}

/// Render the detail panel for one fermenter.
pub fn render_madurador_detail(ctx: &PageContext, card: &MaduradorCard) -> String {
    let segment = path_segment(&card.id);
    let content = format!(
        r#"<div class="container"><section id="detail" class="record-card">
  <div class="card-header">{title}</div>
  <dl class="detail-meta">
    <dt>Litres</dt><dd>{litros}</dd>
    <dt>Status</dt><dd>{estado}</dd>
    <dt>Notes</dt><dd>{notas}</dd>
    <dt>Batch</dt><dd>{lote}</dd>
    <dt>Lot number</dt><dd>{numero}</dd>
  </dl>
  <div class="card-actions"><a class="action-btn" href="/maduradores/{segment}/edit">Edit</a> {delete} <a href="/">Close</a></div>
</section></div>"#,
        title = card_title("Fermenter", card.position),
        litros = html_escape(&card.litros),
        estado = html_escape(&card.estado),
        notas = html_escape(&card.notas),
        lote = html_escape(&card.lote_label),
        numero = html_escape(&card.lote_number),
        delete = delete_button("/maduradores", &card.id),
    );
    build_page(ctx, "Fermenter", &content)
}

/// Render the detail panel for one batch.
pub fn render_lote_detail(ctx: &PageContext, card: &LoteCard) -> String {
    let segment = path_segment(&card.id);
    let content = format!(
        r#"<div class="container"><section id="detail" class="record-card">
  <div class="card-header">{title}</div>
  <dl class="detail-meta">
    <dt>Beer</dt><dd>{cerveza}</dd>
    <dt>Status</dt><dd>{estado}</dd>
    <dt>Litres</dt><dd>{cantidad}</dd>
    <dt>Load date</dt><dd>{carga}</dd>
    <dt>Expiry date</dt><dd>{vence}</dd>
    <dt>Notes</dt><dd>{notas}</dd>
  </dl>
  <div class="card-actions"><a class="action-btn" href="/lotes/{segment}/edit">Edit</a> {delete} <a href="/">Close</a></div>
</section></div>"#,
        title = card_title("Batch", card.position),
        cerveza = html_escape(&card.cerveza),
        estado = html_escape(&card.estado),
        cantidad = html_escape(&card.cantidad_litros),
        carga = html_escape(&card.fecha_carga),
        vence = html_escape(&card.fecha_vencimiento),
        notas = html_escape(&card.notas),
        delete = delete_button("/lotes", &card.id),
    );
    build_page(ctx, "Batch", &content)
}

fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(message) => format!(
            r#"<div class="error-block" role="alert">{}</div>"#,
            html_escape(message)
        ),
        None => String::new(),
    }
}

fn hidden_field(name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!(
            r#"<input type="hidden" name="{name}" value="{}">"#,
            html_escape(value)
        ),
        None => String::new(),
    }
}

/// Render the add/edit form for a fermenter.
pub fn render_madurador_form(ctx: &PageContext, view: &MaduradorFormView) -> String {
    let form = &view.form;
    let title = if form.edit_id().is_some() {
        "Edit fermenter"
    } else {
        "Add fermenter"
    };

    let no_batch_selected = if view.options.iter().any(|o| o.selected) {
        ""
    } else {
        " selected"
    };
    let mut options = format!(r#"<option value=""{no_batch_selected}>No batch</option>"#);
    for option in &view.options {
        options.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            html_escape(&option.id),
            if option.selected { " selected" } else { "" },
            html_escape(&option.label),
        ));
    }

    let content = format!(
        r#"<div class="container"><section id="form">
<h2 id="form-title">{title}</h2>
{error}
<form id="record-form" method="post" action="/maduradores">
  {hidden}
  <label>Litres <input type="number" step="1" name="litros" value="{litros}" required></label>
  <label>Status <input type="text" name="estado" value="{estado}" required></label>
  <label>Batch <select name="lote">{options}</select></label>
  <label>Notes <textarea name="notas">{notas}</textarea></label>
  <div class="card-actions"><button type="submit">Save</button> <a id="cancel" href="/">Cancel</a></div>
</form>
</section></div>"#,
        error = error_banner(view.error.as_deref()),
        hidden = hidden_field("id", form.edit_id())
            + &hidden_field("lote_actual", form.current_lote()),
        litros = html_escape(&form.litros),
        estado = html_escape(&form.estado),
        notas = html_escape(&form.notas),
    );
    build_page(ctx, title, &content)
}

/// Render the add/edit form for a batch.
pub fn render_lote_form(ctx: &PageContext, view: &LoteFormView) -> String {
    let form = &view.form;
    let title = if form.edit_id().is_some() {
        "Edit batch"
    } else {
        "Add batch"
    };
    let content = format!(
        r#"<div class="container"><section id="form">
<h2 id="form-title">{title}</h2>
{error}
<form id="record-form" method="post" action="/lotes">
  {hidden}
  <label>Beer <input type="text" name="cerveza" value="{cerveza}" required></label>
  <label>Status <input type="text" name="estado" value="{estado}" required></label>
  <label>Litres <input type="number" step="1" name="cantidadLitros" value="{cantidad}" required></label>
  <label>Load date <input type="date" name="fechaCarga" value="{carga}"></label>
  <label>Expiry date <input type="date" name="fechaVencimiento" value="{vence}"></label>
  <label>Notes <textarea name="notas">{notas}</textarea></label>
  <div class="card-actions"><button type="submit">Save</button> <a id="cancel" href="/">Cancel</a></div>
</form>
</section></div>"#,
        error = error_banner(view.error.as_deref()),
        hidden = hidden_field("id", form.edit_id()),
        cerveza = html_escape(&form.cerveza),
        estado = html_escape(&form.estado),
        cantidad = html_escape(&form.cantidad_litros),
        carga = html_escape(&form.fecha_carga),
        vence = html_escape(&form.fecha_vencimiento),
        notas = html_escape(&form.notas),
    );
    build_page(ctx, title, &content)
}

/// Render the API base settings page.
pub fn render_settings(
    ctx: &PageContext,
    default_base: &str,
    overridden: bool,
    error: Option<&str>,
) -> String {
    let note = if overridden {
        format!(
            r#"<p class="meta-row">Overriding the default <code>{}</code>. Save an empty value to reset.</p>"#,
            html_escape(default_base)
        )
    } else {
        r#"<p class="meta-row">Using the default backend.</p>"#.to_string()
    };
    let content = format!(
        r#"<div class="container"><section id="settings">
<h2>Backend</h2>
{error}
{note}
<form method="post" action="/settings">
  <label>API base <input type="url" name="api_base" value="{current}"></label>
  <div class="card-actions"><button type="submit">Save</button> <a href="/">Cancel</a></div>
</form>
</section></div>"#,
        error = error_banner(error),
        current = html_escape(&ctx.api_base),
    );
    build_page(ctx, "Settings", &content)
}

/// A plain message page for failures outside a form.
pub fn render_message(ctx: &PageContext, title: &str, message: &str) -> String {
    let content = format!(
        r#"<div class="container"><div class="error-block" role="alert"><strong>{}</strong><br>{}</div><p class="meta-row"><a href="/">Back to list</a></p></div>"#,
        html_escape(title),
        html_escape(message)
    );
    build_page(ctx, title, &content)
}

fn build_page(ctx: &PageContext, title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Madura</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box;}}
body{{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;color:#1a1a1a;background:#fafafa;}}
.header{{background:#1a1a1a;color:#fff;padding:12px 24px;display:flex;align-items:center;justify-content:space-between;}}
.header h1{{font-size:18px;font-weight:600;}}
.header nav a{{color:#ccc;text-decoration:none;margin-left:20px;font-size:14px;}}
.header nav a:hover{{color:#fff;}}
.header .status{{font-size:12px;color:#aaa;margin-left:20px;}}
.container{{max-width:960px;margin:0 auto;padding:24px;}}
.section-head{{display:flex;align-items:center;justify-content:space-between;margin:16px 0 8px;}}
.search{{display:flex;gap:8px;margin-bottom:12px;}}
.search input[type=search]{{flex:1;padding:6px 10px;border:1px solid #ccc;border-radius:4px;}}
.record-card{{background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:16px;margin-bottom:12px;}}
.record-card:hover{{border-color:#999;}}
.card-header{{font-size:16px;font-weight:600;margin-bottom:8px;}}
.record-grid{{display:grid;grid-template-columns:1fr 1fr;gap:6px;font-size:14px;}}
.field .label{{color:#888;margin-right:6px;}}
.card-actions{{display:flex;gap:12px;align-items:center;margin-top:12px;font-size:13px;}}
form.inline{{display:inline;}}
.empty{{color:#666;text-align:center;padding:40px;}}
.meta-row{{font-size:12px;color:#888;margin-top:8px;}}
.action-btn{{display:inline-block;padding:6px 16px;background:#0066cc;color:#fff;border-radius:4px;text-decoration:none;font-size:13px;font-weight:500;}}
.action-btn:hover{{background:#004499;}}
.error-block{{background:#fdecea;border:1px solid #f5c2c0;padding:8px 12px;border-radius:4px;font-size:13px;color:#a00;margin-bottom:12px;}}
.detail-meta{{display:grid;grid-template-columns:1fr 2fr;gap:8px;margin:16px 0;font-size:13px;}}
.detail-meta dt{{color:#888;}}
.detail-meta dd{{color:#333;}}
#record-form label{{display:block;margin-bottom:10px;font-size:13px;color:#555;}}
#record-form input,#record-form select,#record-form textarea{{display:block;width:100%;padding:6px 10px;border:1px solid #ccc;border-radius:4px;margin-top:4px;}}
</style>
</head>
<body>
<div class="header">
    <h1>Madura</h1>
    <nav><a href="/">Fermenters</a><a href="/settings" id="api-url">{api_base}</a><span class="status" id="status">{status}</span></nav>
</div>
{content}
<script>
setInterval(() => fetch('/health').then(r => r.json()).then(j => {{
    document.getElementById('status').textContent = j.backend;
}}).catch(() => {{
    document.getElementById('status').textContent = 'Backend: disconnected';
}}), 15000);
</script>
</body>
</html>"#,
        title = html_escape(title),
        api_base = html_escape(&ctx.api_base),
        status = html_escape(&ctx.status_label),
    )
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::MaduradorForm;
    use crate::views::LoteOption;

    fn ctx() -> PageContext {
        PageContext {
            status_label: "Backend: ok".to_string(),
            api_base: "http://127.0.0.1:8000".to_string(),
        }
    }

    fn card(id: &str, notas: &str) -> MaduradorCard {
        MaduradorCard {
            position: Some(1),
            id: id.to_string(),
            litros: "500".to_string(),
            estado: "activo".to_string(),
            notas: notas.to_string(),
            lote_label: "Batch #1 - IPA".to_string(),
            lote_number: "1".to_string(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(html_escape("<a>&b"), "&lt;a&gt;&amp;b");
    }

    #[test]
    fn empty_lists_show_placeholder() {
        let html = render_index(
            &ctx(),
            &Listing::Loaded { cards: vec![], total: 0 },
            &Listing::Loaded { cards: vec![], total: 0 },
            "",
            "",
        );
        assert_eq!(html.matches("No records available").count(), 2);
    }

    #[test]
    fn failed_load_renders_inline_error() {
        let html = render_index(
            &ctx(),
            &Listing::Failed("Network error: refused".to_string()),
            &Listing::Loaded { cards: vec![], total: 0 },
            "",
            "",
        );
        assert!(html.contains("Error loading fermenters: Network error: refused"));
    }

    #[test]
    fn cards_escape_fields_and_carry_ids() {
        let html = render_index(
            &ctx(),
            &Listing::Loaded {
                cards: vec![card("m1", "<script>x</script>")],
                total: 1,
            },
            &Listing::Loaded { cards: vec![], total: 0 },
            "",
            "",
        );
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains(r#"href="/maduradores/m1/edit" data-id="m1""#));
        assert!(html.contains(r#"action="/maduradores/m1/delete""#));
        assert!(html.contains("Fermenter #1"));
        assert!(html.contains("Batch #1 - IPA"));
    }

    #[test]
    fn ids_are_encoded_as_single_path_segments() {
        let html = render_madurador_detail(&ctx(), &card("a/b c?#", ""));
        assert!(html.contains(r#"href="/maduradores/a%2Fb%20c%3F%23/edit""#));
        assert!(html.contains(r#"action="/maduradores/a%2Fb%20c%3F%23/delete""#));
    }

    #[test]
    fn settings_error_is_shown() {
        let html = render_settings(&ctx(), "http://127.0.0.1:8000", true, Some("bad <url>"));
        assert!(html.contains("bad &lt;url&gt;"));
        assert!(html.contains("Save an empty value to reset"));
    }

    #[test]
    fn filtered_listing_reports_counts() {
        let html = render_index(
            &ctx(),
            &Listing::Loaded {
                cards: vec![card("m2", "")],
                total: 3,
            },
            &Listing::Loaded { cards: vec![], total: 0 },
            "mad 2",
            "",
        );
        assert!(html.contains("1 of 3 shown"));
        assert!(html.contains(r#"value="mad 2""#));
    }

    #[test]
    fn edit_form_has_hidden_id_and_selection() {
        let view = MaduradorFormView {
            form: MaduradorForm {
                id: "m1".into(),
                litros: "10".into(),
                lote: "l2".into(),
                ..Default::default()
            },
            options: vec![LoteOption {
                id: "l2".into(),
                label: "Batch #1 - IPA".into(),
                selected: true,
            }],
            error: Some("Backend said no".into()),
        };
        let html = render_madurador_form(&ctx(), &view);
        assert!(html.contains("Edit fermenter"));
        assert!(html.contains(r#"<input type="hidden" name="id" value="m1">"#));
        assert!(html.contains(r#"<option value="l2" selected>"#));
        assert!(html.contains(r#"<option value="">No batch</option>"#));
        assert!(html.contains("Backend said no"));
    }

    #[test]
    fn add_form_without_batches_selects_none() {
        let view = MaduradorFormView {
            form: MaduradorForm::default(),
            options: vec![],
            error: None,
        };
        let html = render_madurador_form(&ctx(), &view);
        assert!(html.contains("Add fermenter"));
        assert!(html.contains(r#"<option value="" selected>No batch</option>"#));
        assert!(!html.contains(r#"name="id""#));
    }
}
