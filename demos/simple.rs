use confit::parse;
use miette::Report;

fn main() {
    let config = r#"
        [user]
        name = "John Doe"
        email = john.doe@example.com
        languages = [en, de]
    "#;

    match parse(config) {
        Ok(doc) => {
            let user = &doc["user"];
            let name: &str = user["name"].or("anonymous");
            let languages: Vec<&str> = user["languages"].or(Vec::new());
            println!("{name} speaks {}", languages.join(", "));

            match doc.to_json() {
                Ok(json) => println!("Parsed configuration as JSON:\n{json}"),
                Err(e) => eprintln!("Failed to serialize: {e}"),
            }
        }
        Err(e) => eprintln!("{:?}", Report::new(e)),
    }

    // A broken file renders with its source line and a label.
    if let Err(e) = parse("[user]\nname = John\nname = Jane\n") {
        eprintln!("{:?}", Report::new(e));
    }
}
