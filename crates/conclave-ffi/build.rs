fn main() {
    uniffi::generate_scaffolding("src/conclave.udl").unwrap();
}
