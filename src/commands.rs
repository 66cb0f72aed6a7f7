use color_eyre::{eyre::eyre, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{thread_rng, RngCore};
use streamupload::{Diagnostics, TracingSink, UploadSession};

use crate::config::Config;

fn progress_bar(len: Option<u64>) -> Result<ProgressBar> {
    let Some(len) = len else {
        return Ok(ProgressBar::new_spinner());
    };
    let style_data = ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.blue}] {bytes}/{total_bytes} {bytes_per_sec} | {wide_msg:.green}",
    )?
    .progress_chars("-> ");
    let pb = ProgressBar::new(len);
    pb.set_style(style_data);
    Ok(pb)
}

pub fn upload(
    file: &str,
    endpoint: Option<&str>,
    field_name: Option<&str>,
    fields: &[(String, String)],
    trace_id: Option<String>,
    debug: bool,
) -> Result<()> {
    let config = Config::load()?;
    let url = config.endpoint(endpoint)?;
    let field_name = field_name.unwrap_or_else(|| config.field_name());
    let trace_id = trace_id.unwrap_or_else(|| format!("{:016x}", thread_rng().next_u64()));

    let mut diagnostics = Diagnostics::new(trace_id);
    if debug || config.debug {
        diagnostics = diagnostics.with_sink(TracingSink);
    }

    let fields = fields.iter().map(|(k, v)| (k, v));
    let (mut session, content_type) = UploadSession::create(field_name, file, fields, diagnostics)?;
    tracing::info!(trace_id = session.correlation_id(), "uploading {file} to {url}");

    let pb = progress_bar(session.content_length())?;
    pb.set_message(file.to_owned());
    let request = streamupload::prepare(ureq::post(&url), &session, &content_type);
    let result = streamupload::send(request, pb.wrap_read(&mut session));
    pb.finish_and_clear();

    let sent = session.bytes_emitted();
    session.release();
    let response = result?;

    println!("{} {} ({sent} bytes sent)", response.status(), response.status_text());
    println!("{}", response.into_string()?);
    Ok(())
}

pub fn endpoint_add(name: String, url: String) -> Result<()> {
    let mut config = Config::load()?;
    if config.endpoints.contains_key(&name) {
        return Err(eyre!("Endpoint named '{name}' already exists."));
    }
    config.endpoints.insert(name, url);
    config.save()
}

pub fn endpoint_delete(name: &str) -> Result<()> {
    let mut config = Config::load()?;
    config
        .endpoints
        .remove(name)
        .ok_or_else(|| eyre!("Endpoint named '{name}' not found."))?;
    if config.default_endpoint.as_deref() == Some(name) {
        config.default_endpoint = None;
    }
    config.save()
}

pub fn endpoint_list() -> Result<()> {
    let config = Config::load()?;
    let mut names: Vec<_> = config.endpoints.iter().collect();
    names.sort();
    for (name, url) in names {
        let marker = if config.default_endpoint.as_ref() == Some(name) {
            "*"
        } else {
            " "
        };
        println!("{marker} {name}: {url}");
    }
    Ok(())
}

pub fn endpoint_default(name: String) -> Result<()> {
    let mut config = Config::load()?;
    if !config.endpoints.contains_key(&name) {
        return Err(eyre!("Endpoint named '{name}' not found."));
    }
    config.default_endpoint = Some(name);
    config.save()
}
