use loadlink::entry;
use loadlink::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
