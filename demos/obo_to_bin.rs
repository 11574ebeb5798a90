//! Converts an OBO file into the binary format
//!
//! `RUST_LOG=debug cargo run --release --example obo_to_bin go-basic.obo go.bin`
use goterms::Ontology;

fn main() {
    simple_logger::init_with_env().unwrap();
    let mut args = std::env::args();
    if args.len() == 3 {
        let obo = args.nth(1).unwrap();
        let mut ontology = match Ontology::from_obo(&obo) {
            Ok(ontology) => ontology,
            Err(err) => {
                println!("Error: {}", err);
                return;
            }
        };
        println!("{:?}", ontology);
        let filename = args.next().unwrap();
        match ontology.save(&filename) {
            Ok(()) => println!("Saved output"),
            Err(err) => println!("Error: {}", err),
        };
    } else {
        println!("Please specify an OBO file and an output file")
    }
}
