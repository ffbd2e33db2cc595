fn main() {
    marketplace_platform::build_utils::compile_service_protos().expect("failed to compile protos");
}
