fn main() {
    let dir = std::env::var("MARKETPLACE_PROTO_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("../proto"));
    marketplace_platform::build_utils::compile_protos_from_dir(&dir).expect("failed to compile protos");
}
