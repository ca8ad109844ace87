fn main() {
    mergepool::main()
}
