//! A tiny in-memory site served with the joist core: one connection at a
//! time in each task, one request per connection, no keep-alive.
//!
//! Run with `cargo run --example static_site`, then open
//! `http://127.0.0.1:8080/`.

use joist::{ContentType, Cursor, Method, Request, Response, StatusCode};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

const INDEX_HTML: &str = "<!DOCTYPE html>\n\
    <html><head><title>joist</title></head>\n\
    <body><h1>It works</h1><p>Served without a framework.</p></body></html>\n";

const STYLE_CSS: &str = "body { font-family: sans-serif; margin: 2rem; }\n";

fn route(request: &Request) -> Response {
    if request.method() != Method::Get {
        return Response::new(StatusCode::MethodNotAllowed, ContentType::TextPlain)
            .body("only GET is served here\n");
    }

    match request.url() {
        "/" | "/index.html" => {
            Response::new(StatusCode::Ok, ContentType::TextHtml).body(INDEX_HTML)
        }
        "/style.css" => Response::new(StatusCode::Ok, ContentType::TextCss).body(STYLE_CSS),
        _ => Response::new(StatusCode::NotFound, ContentType::TextHtml)
            .body("<h1>404 Not Found</h1>\n"),
    }
}

async fn serve(mut socket: TcpStream) -> std::io::Result<()> {
    let mut buffer = vec![0u8; 8 * 1024];
    let mut filled = 0;

    // Read until the header terminator arrives; bodies are not parsed.
    loop {
        let n = socket.read(&mut buffer[filled..]).await?;
        if n == 0 {
            return Ok(());
        }
        filled += n;

        if buffer[..filled].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if filled == buffer.len() {
            let reply = Response::new(
                StatusCode::RequestHeaderFieldsTooLarge,
                ContentType::TextPlain,
            )
            .body("headers too large\n");
            socket.write_all(&reply.render()).await?;
            return Ok(());
        }
    }

    let reply = match Request::parse(Cursor::new(&buffer[..filled])) {
        Ok((_, request)) => {
            log::info!(
                "{:?} {} ({} header(s), {} byte(s))",
                request.method(),
                request.url(),
                request.headers().len(),
                request.consumed(),
            );
            route(&request)
        }
        Err(err) => {
            log::warn!("rejecting request: {err}");
            Response::new(StatusCode::BadRequest, ContentType::TextPlain)
                .body(format!("bad request: {err}\n"))
        }
    };

    socket.write_all(&reply.render()).await?;
    socket.shutdown().await
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let listener = TcpListener::bind("127.0.0.1:8080").await?;
    log::info!("listening on http://127.0.0.1:8080");

    loop {
        let (socket, peer) = listener.accept().await?;
        tokio::spawn(async move {
            if let Err(err) = serve(socket).await {
                log::error!("connection {peer}: {err}");
            }
        });
    }
}
