use {anyhow::Context as _, async_trait::async_trait, herald_config::HeraldConfig, std::io::Cursor};

use crate::{
    command::Command,
    context::{Invocation, Reply, ReplyFile},
    spec::{CommandOption, CommandSpec, OptionKind},
};

/// QR capacity at medium error correction is well above this; the cap keeps
/// the rendered code scannable.
const MAX_PAYLOAD_LEN: usize = 1000;

/// `/qrcode` — renders a text payload as a QR code PNG attachment.
pub struct QrCodeCommand {
    spec: CommandSpec,
}

impl QrCodeCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec::new("qrcode", "Render text or a link as a QR code", "utility")
                .option(
                    CommandOption::new("text", "Payload to encode", OptionKind::String).required(),
                ),
        }
    }
}

impl Default for QrCodeCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `payload` as a PNG QR code.
fn render_png(payload: &str) -> anyhow::Result<Vec<u8>> {
    let code = qrcode::QrCode::new(payload.as_bytes()).context("payload too large for QR code")?;
    let img = code
        .render::<image::Luma<u8>>()
        .min_dimensions(256, 256)
        .build();

    let mut buf = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("failed to encode QR code PNG")?;
    Ok(buf)
}

#[async_trait]
impl Command for QrCodeCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(&self, invocation: &Invocation, _config: &HeraldConfig) -> anyhow::Result<()> {
        invocation.responder.defer(false).await?;

        let payload = invocation.str_option("text").unwrap_or_default();
        if payload.is_empty() || payload.len() > MAX_PAYLOAD_LEN {
            return invocation
                .responder
                .edit(Reply::ephemeral(format!(
                    "Provide between 1 and {MAX_PAYLOAD_LEN} characters to encode."
                )))
                .await;
        }

        let png = render_png(payload)?;
        invocation
            .responder
            .edit(Reply::text("Here is your QR code:").with_file(ReplyFile {
                name: "qrcode.png".to_string(),
                content_type: "image/png".to_string(),
                data: png,
            }))
            .await
    }
}
