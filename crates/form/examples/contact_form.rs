use bytes::Bytes;
use http::Request;
use http::header::CONTENT_TYPE;
use http_body_util::Full;
use micro_form::{FormContent, ParseError, fn_sink, parse_form, parse_form_with_config};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

const BOUNDARY: &str = "----contact-form";

fn request(content_type: &str, body: impl Into<Bytes>) -> Request<Full<Bytes>> {
    Request::post("/contact")
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(body.into()))
        .expect("example request should be valid")
}

fn report(label: &str, result: Result<FormContent, ParseError>) {
    match result {
        Ok(content) => {
            for (name, values) in &content.values {
                info!(label, field = %name, ?values, "value");
            }
            for (name, files) in &content.files {
                for file in files {
                    info!(label, field = %name, file_name = file.file_name(), size = file.size(), in_memory = file.is_in_memory(), "file");
                }
            }
        }
        Err(e) => {
            let response = e.into_response();
            warn!(label, status = %response.status(), body = %response.body(), "rejected");
        }
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // curl -d "name=charlie&topic=billing&topic=support&notes=" http://127.0.0.1:8080/contact
    let url_encoded = request("application/x-www-form-urlencoded", "name=charlie&topic=billing&topic=support&notes=");
    report("url encoded", parse_form(url_encoded, &()).await);

    // curl -H 'Content-Type: application/json' -d '{"name":"charlie","topic":["billing"]}' http://127.0.0.1:8080/contact
    let json = request("application/json", r#"{"name": "charlie", "topic": ["billing"]}"#);
    report("json", parse_form(json, &()).await);

    let json = request("application/json", r#"{"name": "charlie", "age": 42}"#);
    report("json with number", parse_form(json, &()).await);

    let multipart = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"name\"\r\n\r\n\
         charlie\r\n\
         --{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"attachment\"; filename=\"notes.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         call me back after lunch\r\n\
         --{BOUNDARY}--\r\n"
    );
    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");

    // a memory budget of 8 bytes forces the attachment onto disk
    let parser = parse_form_with_config(1024, 1024, 8);
    report("multipart", parser.parse(request(&content_type, multipart.clone()), &()).await);

    let parser = parse_form_with_config(1024, 64, 8);
    let sink = fn_sink(|limit| warn!(limit, "client sent more than allowed, closing connection"));
    report("multipart over limit", parser.parse(request(&content_type, multipart), &sink).await);
}
