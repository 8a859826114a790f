//! Build script to compile protobuf definitions.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Messages double as the JSON bodies of the HTTP gateway, so they carry
    // serde derives with their original snake_case field names.
    tonic_build::configure()
        .type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]")
        .message_attribute(".", "#[serde(default)]")
        .compile_protos(
            &[
                "../../proto/api.proto",
                "../../proto/kifu.proto",
                "../../proto/account.proto",
            ],
            &["../../proto"],
        )?;
    Ok(())
}
